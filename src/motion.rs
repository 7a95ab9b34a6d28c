//! Grid-aligned movement shared by every actor.
//!
//! Each tick an actor probes the four sides of its bounding box one `speed`
//! step ahead. A side can only be taken when the actor sits exactly on the
//! grid line of the perpendicular axis, so turns happen at cell boundaries
//! and never mid-cell.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::components::{Direction, DirectionSet};
use crate::geometry::{is_solid, rect_overlap, Circle, Rect, Vec2};
use crate::tilemap::Tilemap;

/// Tolerance for "exactly on a grid line".
pub const ALIGN_EPSILON: f32 = 1e-3;
/// Milliseconds in one nominal tick (60 fps).
pub const FRAME_MS: f32 = 1000.0 / 60.0;
/// Real frame gaps longer than this count as a single tick.
const MAX_FRAME_GAP_MS: f32 = 1000.0 / 30.0;

/// Movable body shared by the player and the ghosts. Position is the
/// top-left corner of the bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub position: Vec2,
    pub velocity: Vec2,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    /// Pixels per tick.
    pub speed: f32,
    pub direction: Direction,
    pub requested: Option<Direction>,
    /// Blocked sides recorded since the last direction change.
    pub collisions: DirectionSet,
}

impl Actor {
    pub fn new(position: Vec2, size: f32, speed: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            width: size,
            height: size,
            radius: size / 3.0,
            speed,
            direction: Direction::None,
            requested: None,
            collisions: DirectionSet::EMPTY,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::at(self.position, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    pub fn circle(&self) -> Circle {
        Circle {
            center: self.center(),
            radius: self.radius,
        }
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.velocity = direction.velocity(self.speed);
        self.direction = direction;
    }

    pub fn freeze(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    pub fn is_moving(&self) -> bool {
        !self.velocity.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Clear,
    /// A solid tile overlaps the probe box.
    Blocked,
    /// Off the grid line on the perpendicular axis.
    Misaligned,
}

impl Probe {
    pub fn is_clear(self) -> bool {
        self == Probe::Clear
    }
}

pub fn is_aligned(value: f32, size: f32) -> bool {
    let cells = value / size;
    (cells - cells.round()).abs() * size < ALIGN_EPSILON
}

fn snap(value: f32, size: f32) -> f32 {
    (value / size).round() * size
}

/// Probes one side of `actor` a `speed` step ahead.
pub fn probe(actor: &Actor, map: &Tilemap, direction: Direction) -> Probe {
    let size = map.size;
    let (x, y) = (actor.position.x, actor.position.y);
    let aligned = if direction.is_vertical() {
        is_aligned(x, size)
    } else {
        is_aligned(y, size)
    };
    if direction == Direction::None || !aligned {
        return Probe::Misaligned;
    }

    // Cells are half-open, so the far edge of a box that ends exactly on a
    // grid line still belongs to the cell before it.
    let s = actor.speed;
    let point = match direction {
        Direction::Up => Vec2::new(snap(x, size), y - s),
        Direction::Down => Vec2::new(snap(x, size), y + actor.height + s - ALIGN_EPSILON),
        Direction::Left => Vec2::new(x - s, snap(y, size)),
        Direction::Right => Vec2::new(x + actor.width + s - ALIGN_EPSILON, snap(y, size)),
        Direction::None => return Probe::Misaligned,
    };

    let shifted = actor.bounds().offset(direction.velocity(s));
    match map.index_at(point.x, point.y) {
        Some(index) => {
            let tile = map.tile(index);
            if is_solid(tile) && rect_overlap(&shifted, &map.tile_rect(index)) {
                Probe::Blocked
            } else {
                Probe::Clear
            }
        }
        // Outside the grid nothing collides.
        None => Probe::Clear,
    }
}

/// Sides that cannot be taken right now.
pub fn blocked_directions(actor: &Actor, map: &Tilemap) -> DirectionSet {
    Direction::CARDINAL
        .into_iter()
        .filter(|d| !probe(actor, map, *d).is_clear())
        .collect()
}

/// Picks a new heading at intersections and dead ends.
///
/// Returns the direction that was applied, if any.
pub fn steer<R: Rng + ?Sized>(actor: &mut Actor, map: &Tilemap, rng: &mut R) -> Option<Direction> {
    let blocked = blocked_directions(actor, map);
    if blocked.len() > actor.collisions.len() {
        actor.collisions = blocked;
    }

    let heading = actor.requested.unwrap_or(actor.direction);
    let reverse = heading.opposite();

    if blocked != actor.collisions {
        let mut recorded = actor.collisions;
        recorded.insert(heading);
        let mut pathways = recorded.difference(blocked);
        pathways.remove(reverse);
        actor.collisions = DirectionSet::EMPTY;
        trace!(?blocked, ?pathways, "intersection");
        return choose(actor, pathways, blocked, heading, rng);
    }

    if blocked.contains(heading) {
        let mut pathways = DirectionSet::ALL.difference(blocked);
        pathways.remove(reverse);
        return choose(actor, pathways, blocked, heading, rng);
    }
    None
}

fn choose<R: Rng + ?Sized>(
    actor: &mut Actor,
    pathways: DirectionSet,
    blocked: DirectionSet,
    heading: Direction,
    rng: &mut R,
) -> Option<Direction> {
    if let Some(next) = pathways.to_vec().choose(rng).copied() {
        actor.set_direction(next);
        return Some(next);
    }
    if !blocked.contains(heading) {
        return None;
    }
    // Dead end. Keeping the velocity here would push the ghost into the
    // wall in front of it, so it turns back.
    let reverse = heading.opposite();
    if reverse != Direction::None && !blocked.contains(reverse) {
        actor.set_direction(reverse);
        return Some(reverse);
    }
    actor.freeze();
    None
}

pub fn integrate(actor: &mut Actor, dt: f32) {
    actor.position += actor.velocity * dt;
}

/// Tick multiplier for real frame gaps: 1 at 60 fps, rounded to whole
/// ticks, and 1 whenever a frame took longer than two nominal frames. What
/// rounding leaves over is carried, so short frames (above 120 fps) still
/// add up to ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickClock {
    carry_ms: f32,
}

impl TickClock {
    pub fn advance(&mut self, gap_ms: f32) -> f32 {
        if gap_ms > MAX_FRAME_GAP_MS {
            self.carry_ms = 0.0;
            return 1.0;
        }
        let total = gap_ms + self.carry_ms;
        let dt = (total / FRAME_MS).round().max(0.0);
        self.carry_ms = total - dt * FRAME_MS;
        dt
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::assets::Assets;
    use crate::level::LevelData;

    const SIZE: f32 = 40.0;

    fn map(rows: &[&str]) -> Tilemap {
        let level = LevelData::from_rows(rows, SIZE).expect("layout");
        Tilemap::setup(&level, &Assets::default())
    }

    fn actor_at(col: usize, row: usize) -> Actor {
        Actor::new(Vec2::new(col as f32 * SIZE, row as f32 * SIZE), SIZE, 2.0)
    }

    #[test]
    fn alignment_tolerates_float_drift() {
        assert!(is_aligned(80.0, SIZE));
        assert!(is_aligned(80.0004, SIZE));
        assert!(is_aligned(79.9996, SIZE));
        assert!(!is_aligned(80.01, SIZE));
        assert!(!is_aligned(82.0, SIZE));
    }

    #[test]
    fn aligned_probe_into_wall_is_blocked() {
        let m = map(&["bbb", "b b", "bbb"]);
        let a = actor_at(1, 1);
        for d in Direction::CARDINAL {
            assert_eq!(probe(&a, &m, d), Probe::Blocked, "{d:?}");
        }
        assert_eq!(blocked_directions(&a, &m), DirectionSet::ALL);
    }

    #[test]
    fn misaligned_actor_is_blocked_everywhere() {
        let m = map(&["     ", "     ", "     "]);
        let mut a = actor_at(1, 1);
        a.position = Vec2::new(42.0, 46.0);
        for d in Direction::CARDINAL {
            assert_eq!(probe(&a, &m, d), Probe::Misaligned, "{d:?}");
        }
    }

    #[test]
    fn misaligned_on_one_axis_only_blocks_the_turns() {
        let m = map(&["     ", "     ", "     "]);
        let mut a = actor_at(1, 1);
        a.position.x = 42.0;
        assert_eq!(probe(&a, &m, Direction::Up), Probe::Misaligned);
        assert_eq!(probe(&a, &m, Direction::Down), Probe::Misaligned);
        assert_eq!(probe(&a, &m, Direction::Left), Probe::Clear);
        assert_eq!(probe(&a, &m, Direction::Right), Probe::Clear);
    }

    #[test]
    fn probe_off_the_grid_is_clear() {
        let m = map(&["  "]);
        let a = actor_at(0, 0);
        assert_eq!(probe(&a, &m, Direction::Left), Probe::Clear);
        assert_eq!(probe(&a, &m, Direction::Up), Probe::Clear);
    }

    #[test]
    fn actor_stops_flush_against_a_wall() {
        let m = map(&["bbbbb", "b   b", "bbbbb"]);
        let mut a = actor_at(1, 1);
        a.set_direction(Direction::Right);
        for _ in 0..200 {
            if probe(&a, &m, Direction::Right) == Probe::Blocked {
                break;
            }
            integrate(&mut a, 1.0);
        }
        assert_eq!(a.position, Vec2::new(3.0 * SIZE, SIZE));
    }

    #[test]
    fn corridor_keeps_heading() {
        let m = map(&["bbbbb", "     ", "bbbbb"]);
        let mut a = actor_at(1, 1);
        a.set_direction(Direction::Right);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(steer(&mut a, &m, &mut rng), None);
            integrate(&mut a, 1.0);
        }
        assert_eq!(a.direction, Direction::Right);
        assert_eq!(a.position.x, SIZE + 40.0);
    }

    #[test]
    fn blocked_heading_turns_without_reversing() {
        // Moving right into a wall with openings up and down.
        let m = map(&["b b", "  b", "b b"]);
        for seed in 0..32 {
            let mut a = actor_at(1, 1);
            a.set_direction(Direction::Right);
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = steer(&mut a, &m, &mut rng).expect("turn");
            assert!(matches!(chosen, Direction::Up | Direction::Down), "{chosen:?}");
            assert_ne!(chosen, Direction::Left);
        }
    }

    #[test]
    fn dead_end_reverses() {
        let m = map(&["bbb", "  b", "bbb"]);
        let mut a = actor_at(1, 1);
        a.set_direction(Direction::Right);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(steer(&mut a, &m, &mut rng), Some(Direction::Left));
        assert_eq!(a.velocity, Vec2::new(-2.0, 0.0));
    }

    #[test]
    fn opening_side_passage_offers_a_choice_but_never_reverse() {
        // Corridor along row 1 with a side opening above column 2.
        let m = map(&["bb bb", "     ", "bbbbb"]);
        let mut seen = DirectionSet::EMPTY;
        for seed in 0..64 {
            let mut a = actor_at(1, 1);
            a.set_direction(Direction::Right);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut turned = None;
            for _ in 0..40 {
                if let Some(d) = steer(&mut a, &m, &mut rng) {
                    turned = Some(d);
                    break;
                }
                integrate(&mut a, 1.0);
            }
            if let Some(d) = turned {
                assert_ne!(d, Direction::Left);
                seen.insert(d);
            }
        }
        assert!(seen.contains(Direction::Up));
        assert!(seen.contains(Direction::Right));
    }

    #[test]
    fn recorded_collisions_do_not_shrink_on_their_own() {
        let m = map(&["bbbbb", "     ", "bbbbb"]);
        let mut a = actor_at(1, 1);
        a.set_direction(Direction::Right);
        let mut rng = StdRng::seed_from_u64(3);
        steer(&mut a, &m, &mut rng);
        let recorded = a.collisions;
        assert!(recorded.contains(Direction::Up) && recorded.contains(Direction::Down));
        integrate(&mut a, 1.0);
        steer(&mut a, &m, &mut rng);
        assert_eq!(a.collisions, recorded);
    }

    #[test]
    fn tick_clock_normalises_and_clamps() {
        assert_eq!(TickClock::default().advance(FRAME_MS), 1.0);
        assert_eq!(TickClock::default().advance(1.9 * FRAME_MS), 2.0);
        assert_eq!(TickClock::default().advance(50.0), 1.0);
        assert_eq!(TickClock::default().advance(500.0), 1.0);
        assert_eq!(TickClock::default().advance(1.0), 0.0);
    }

    #[test]
    fn tick_clock_keeps_game_time_at_high_frame_rates() {
        let mut clock = TickClock::default();
        let gap = 1000.0 / 144.0;
        let ticks: f32 = (0..144).map(|_| clock.advance(gap)).sum();
        assert_eq!(ticks, 60.0);

        let mut clock = TickClock::default();
        assert_eq!(clock.advance(FRAME_MS), 1.0);
        assert_eq!(clock.advance(FRAME_MS), 1.0);
        assert_eq!(clock.advance(500.0), 1.0);
    }
}
