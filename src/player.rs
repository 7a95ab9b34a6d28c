use std::f32::consts::PI;

use tracing::{debug, info};

use crate::components::{Color, Direction};
use crate::geometry::{is_solid, rect_overlap, Vec2};
use crate::motion::{integrate, is_aligned, probe, Actor, Probe};
use crate::tilemap::{ScoreEvent, Tilemap};
use crate::timer::Countdown;

pub const PLAYER_SPEED: f32 = 2.0;
pub const START_DELAY_MS: f32 = 1000.0;
pub const MOUTH_IDLE: f32 = 0.55;
const CHOMPING_RATE: f32 = 0.12;
const LOSE_MOUTH_STEP: f32 = 0.05;

#[derive(Debug, Clone)]
pub struct Player {
    pub actor: Actor,
    pub mouth_gap: f32,
    pub chomping_rate: f32,
    pub rotation: f32,
    pub color: Color,
    start: Option<Countdown>,
    spawn: Vec2,
}

impl Player {
    pub fn new(tile: (usize, usize), size: f32) -> Self {
        let spawn = Vec2::new(tile.0 as f32 * size, tile.1 as f32 * size);
        Self {
            actor: Actor::new(spawn, size, PLAYER_SPEED),
            mouth_gap: MOUTH_IDLE,
            chomping_rate: CHOMPING_RATE,
            rotation: 0.0,
            color: Color::YELLOW,
            start: Some(Countdown::new(START_DELAY_MS)),
            spawn,
        }
    }

    pub fn has_started(&self) -> bool {
        self.start.is_none()
    }

    /// Queues a turn, taken at the next cell boundary where it is open.
    pub fn request(&mut self, direction: Direction) {
        self.actor.requested = Some(direction);
    }

    pub fn update(&mut self, map: &mut Tilemap, dt: f32, dt_ms: f32) -> Option<ScoreEvent> {
        if let Some(start) = self.start.as_mut() {
            if !start.advance(dt_ms) {
                return None;
            }
            self.start = None;
            self.face(Direction::Left);
            info!("pacman released");
        }

        self.apply_request(map);
        integrate(&mut self.actor, dt);
        let event = map.consume_pellet_if_overlapping(&self.actor);
        self.stop_at_leading_edge(map);
        self.chomp(dt);
        event
    }

    fn apply_request(&mut self, map: &mut Tilemap) {
        let Some(wanted) = self.actor.requested else {
            return;
        };
        match probe(&self.actor, map, wanted) {
            Probe::Clear => {
                self.face(wanted);
                self.actor.requested = None;
                debug!(direction = ?wanted, "turn taken");
            }
            Probe::Blocked => {
                if wanted.is_vertical() {
                    self.actor.velocity.y = 0.0;
                } else {
                    self.actor.velocity.x = 0.0;
                }
                let wall = self.actor.center() + wanted.velocity(map.size);
                map.flash_wall_at(wall.x, wall.y);
            }
            Probe::Misaligned => {}
        }
    }

    fn face(&mut self, direction: Direction) {
        self.actor.set_direction(direction);
        self.rotation = direction.rotation();
    }

    /// Halts on the wall the leading edge just reached and settles onto the
    /// grid line in front of it.
    fn stop_at_leading_edge(&mut self, map: &Tilemap) {
        if !self.actor.is_moving() {
            return;
        }
        let a = &self.actor;
        let (x, y, s) = (a.position.x, a.position.y, a.speed);
        let edge = match a.direction {
            Direction::Right => Vec2::new(x + a.width, y),
            Direction::Left => Vec2::new(x - s, y),
            Direction::Down => Vec2::new(x, y + a.height),
            Direction::Up => Vec2::new(x, y - s),
            Direction::None => return,
        };
        let Some(index) = map.index_at(edge.x, edge.y) else {
            return;
        };
        if !is_solid(map.tile(index)) || !rect_overlap(&a.bounds(), &map.tile_rect(index)) {
            return;
        }

        let forward = matches!(a.direction, Direction::Right | Direction::Down);
        let size = map.size;
        if a.direction.is_vertical() {
            self.actor.position.y = settle(y, size, forward);
        } else {
            self.actor.position.x = settle(x, size, forward);
        }
        self.actor.freeze();
    }

    fn chomp(&mut self, dt: f32) {
        if !self.actor.is_moving() {
            return;
        }
        self.mouth_gap += self.chomping_rate * dt;
        if self.mouth_gap < 0.0 || self.mouth_gap > MOUTH_IDLE {
            self.chomping_rate = -self.chomping_rate;
            self.mouth_gap = self.mouth_gap.clamp(0.0, MOUTH_IDLE);
        }
    }

    pub fn freeze(&mut self) {
        self.actor.freeze();
        self.actor.requested = None;
    }

    /// One frame of the losing animation. Returns `true` once fully open.
    pub fn open_mouth(&mut self) -> bool {
        self.mouth_gap = (self.mouth_gap + LOSE_MOUTH_STEP).min(PI);
        self.mouth_gap >= PI
    }

    pub fn reset(&mut self) {
        let size = self.actor.width;
        self.actor = Actor::new(self.spawn, size, PLAYER_SPEED);
        self.mouth_gap = MOUTH_IDLE;
        self.chomping_rate = CHOMPING_RATE;
        self.rotation = 0.0;
        self.start = Some(Countdown::new(START_DELAY_MS));
    }
}

fn settle(value: f32, size: f32, forward: bool) -> f32 {
    let cells = value / size;
    let cells = if is_aligned(value, size) {
        cells.round()
    } else if forward {
        cells.floor()
    } else {
        cells.ceil()
    };
    cells * size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Assets;
    use crate::components::Tile;
    use crate::level::LevelData;
    use crate::motion::FRAME_MS;

    const SIZE: f32 = 40.0;

    fn map(rows: &[&str]) -> Tilemap {
        let level = LevelData::from_rows(rows, SIZE).expect("layout");
        Tilemap::setup(&level, &Assets::default())
    }

    fn run(player: &mut Player, map: &mut Tilemap, frames: usize) -> Vec<ScoreEvent> {
        (0..frames)
            .filter_map(|_| player.update(map, 1.0, FRAME_MS))
            .collect()
    }

    #[test]
    fn waits_then_heads_left() {
        let mut m = map(&["bbbbbb", "b    b", "bbbbbb"]);
        let mut p = Player::new((3, 1), SIZE);
        run(&mut p, &mut m, 30);
        assert!(!p.has_started());
        assert_eq!(p.actor.position, Vec2::new(120.0, 40.0));
        run(&mut p, &mut m, 40);
        assert!(p.has_started());
        assert_eq!(p.actor.direction, Direction::Left);
        assert_eq!(p.rotation, PI);
    }

    #[test]
    fn stops_flush_against_the_wall() {
        let mut m = map(&["bbbbbb", "b    b", "bbbbbb"]);
        let mut p = Player::new((3, 1), SIZE);
        run(&mut p, &mut m, 200);
        assert_eq!(p.actor.position, Vec2::new(40.0, 40.0));
        assert!(!p.actor.is_moving());
    }

    #[test]
    fn overshoot_settles_on_the_grid() {
        let mut m = map(&["bbbbbb", "b    b", "bbbbbb"]);
        let mut p = Player::new((1, 1), SIZE);
        p.start = None;
        p.face(Direction::Right);
        for _ in 0..100 {
            p.update(&mut m, 7.0, 7.0 * FRAME_MS);
        }
        assert_eq!(p.actor.position, Vec2::new(160.0, 40.0));
        assert!(!p.actor.is_moving());
    }

    #[test]
    fn blocked_request_flashes_the_wall_and_waits_for_an_opening() {
        let mut m = map(&["bb bb", "b   b", "bbbbb"]);
        let mut p = Player::new((3, 1), SIZE);
        p.request(Direction::Up);
        run(&mut p, &mut m, 61);
        assert!(p.has_started());
        match m.tile(3) {
            Some(Tile::Wall(w)) => assert_eq!(w.opacity, 1.0),
            other => panic!("expected wall, got {other:?}"),
        }
        assert_eq!(p.actor.requested, Some(Direction::Up));

        run(&mut p, &mut m, 25);
        assert_eq!(p.actor.direction, Direction::Up);
        assert_eq!(p.actor.position.x, 80.0);
        assert!(p.actor.requested.is_none());
    }

    #[test]
    fn eats_pellets_along_the_corridor() {
        let mut m = map(&["bbbbbb", "b.. .b", "bbbbbb"]);
        let mut p = Player::new((3, 1), SIZE);
        let events = run(&mut p, &mut m, 200);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.score == 10 && !e.is_power_up));
        assert_eq!(m.remaining_pellets(), 1);
    }

    #[test]
    fn mouth_stays_within_its_range() {
        let mut m = map(&["          "]);
        let mut p = Player::new((9, 0), SIZE);
        p.start = None;
        p.face(Direction::Left);
        let mut seen_closed = false;
        for _ in 0..100 {
            p.update(&mut m, 1.0, FRAME_MS);
            assert!((0.0..=MOUTH_IDLE).contains(&p.mouth_gap));
            seen_closed |= p.mouth_gap == 0.0;
        }
        assert!(seen_closed);
    }

    #[test]
    fn lose_animation_opens_to_a_half_turn() {
        let mut p = Player::new((0, 0), SIZE);
        let frames = (0..100).take_while(|_| !p.open_mouth()).count();
        assert!(frames > 40);
        assert_eq!(p.mouth_gap, PI);
    }

    #[test]
    fn reset_returns_to_spawn_and_rearms_the_start() {
        let mut m = map(&["bbbbbb", "b    b", "bbbbbb"]);
        let mut p = Player::new((3, 1), SIZE);
        run(&mut p, &mut m, 90);
        p.reset();
        assert_eq!(p.actor.position, Vec2::new(120.0, 40.0));
        assert!(!p.actor.is_moving());
        assert!(!p.has_started());
    }
}
