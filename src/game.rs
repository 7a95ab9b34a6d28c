//! One play session: owns the maze, the actors and the score, and runs the
//! per-frame update in a fixed order.

use std::sync::mpsc::Receiver;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::assets::Assets;
use crate::components::{Color, Direction};
use crate::config::Settings;
use crate::error::GameResult;
use crate::geometry::circle_overlap;
use crate::ghost::{roster, Ghost};
use crate::level::LevelData;
use crate::motion::{TickClock, FRAME_MS};
use crate::player::Player;
use crate::render::{draw_banner, draw_ghost, draw_player, draw_tilemap, Surface};
use crate::tilemap::{ScoreEvent, Tilemap};

const BANNER_SHADOW: Color = Color::hex(0x333333);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Running,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u32,
    /// Best score of this process; never persisted.
    pub high: u32,
}

impl Scoreboard {
    pub fn add(&mut self, points: u32) {
        self.score += points;
        self.high = self.high.max(self.score);
    }

    pub fn reset(&mut self) {
        self.score = 0;
    }
}

pub struct Game {
    level: LevelData,
    assets: Assets,
    map: Tilemap,
    events: Receiver<ScoreEvent>,
    player: Player,
    ghosts: Vec<Ghost>,
    rng: StdRng,
    clock: TickClock,
    state: GameState,
    scoreboard: Scoreboard,
    debug: bool,
}

impl Game {
    pub fn new(level: LevelData, assets: Assets, settings: &Settings) -> GameResult<Self> {
        let ghosts = roster(settings.ghosts.as_slice(), level.size, settings.fright_ms)?;
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut map = Tilemap::setup(&level, &assets);
        map.draw_grid_lines = settings.debug_grid;
        let events = map.subscribe();
        let player = Player::new(level.player_start, level.size);
        info!(
            ghosts = ghosts.len(),
            pellets = level.pellet_count(),
            target = map.target_score(),
            "game ready"
        );

        Ok(Self {
            level,
            assets,
            map,
            events,
            player,
            ghosts,
            rng,
            clock: TickClock::default(),
            state: GameState::Running,
            scoreboard: Scoreboard::default(),
            debug: settings.debug_grid,
        })
    }

    /// Replaces the roster, e.g. for mazes other than the stock one.
    pub fn with_ghosts(mut self, ghosts: Vec<Ghost>) -> Self {
        self.ghosts = ghosts;
        self
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    pub fn map(&self) -> &Tilemap {
        &self.map
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn ghosts_mut(&mut self) -> &mut [Ghost] {
        &mut self.ghosts
    }

    /// Maze size in pixels.
    pub fn width(&self) -> f32 {
        self.map.cols as f32 * self.map.size
    }

    pub fn height(&self) -> f32 {
        self.map.rows as f32 * self.map.size
    }

    pub fn request_direction(&mut self, direction: Direction) {
        if self.state == GameState::Running {
            self.player.request(direction);
        }
    }

    /// Runs one frame. `gap_ms` is the real time since the previous one.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: &mut S, gap_ms: f32) {
        let dt = self.clock.advance(gap_ms);
        let dt_ms = dt * FRAME_MS;

        surface.clear();
        self.map.tick(dt_ms);
        draw_tilemap(surface, &self.map);

        if self.state == GameState::Running && self.caught_by_ghost() {
            self.lose();
        }
        if self.state == GameState::Lost {
            self.draw_lost(surface);
            surface.save_frame();
            return;
        }

        let running = self.state == GameState::Running;
        for ghost in &mut self.ghosts {
            if running {
                ghost.update(&self.map, dt, dt_ms, &mut self.rng);
            }
            draw_ghost(surface, ghost, self.debug);
        }

        if running {
            self.player.update(&mut self.map, dt, dt_ms);
        }
        draw_player(surface, &self.player, self.debug);

        while let Ok(event) = self.events.try_recv() {
            self.on_score(event);
        }
        if self.state == GameState::Won {
            draw_banner(surface, self.width(), ["You", "Won"], Color::YELLOW, BANNER_SHADOW);
        }
        surface.save_frame();
    }

    fn caught_by_ghost(&self) -> bool {
        let pac = self.player.actor.circle();
        // Frightened ghosts pass through harmlessly.
        self.ghosts
            .iter()
            .any(|g| !g.is_scared() && circle_overlap(&g.actor.circle(), &pac))
    }

    fn on_score(&mut self, event: ScoreEvent) {
        if self.state != GameState::Running {
            return;
        }
        self.scoreboard.add(event.score);
        if self.scoreboard.score == event.target_score {
            self.win();
        } else if event.is_power_up {
            for ghost in &mut self.ghosts {
                ghost.enter_frightened();
            }
        }
    }

    fn win(&mut self) {
        self.state = GameState::Won;
        self.freeze_all();
        info!(score = self.scoreboard.score, "level cleared");
    }

    fn lose(&mut self) {
        self.state = GameState::Lost;
        self.freeze_all();
        warn!(score = self.scoreboard.score, "pacman caught");
    }

    fn freeze_all(&mut self) {
        self.player.freeze();
        for ghost in &mut self.ghosts {
            ghost.freeze();
        }
    }

    fn draw_lost<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        for ghost in &self.ghosts {
            draw_ghost(surface, ghost, self.debug);
        }
        self.player.open_mouth();
        draw_player(surface, &self.player, self.debug);
        draw_banner(surface, self.width(), ["You", "Lose"], Color::RED, BANNER_SHADOW);
    }

    /// Fresh maze and actors; the high score survives.
    pub fn restart(&mut self) {
        let grid_lines = self.map.draw_grid_lines;
        self.map = Tilemap::setup(&self.level, &self.assets);
        self.map.draw_grid_lines = grid_lines;
        self.events = self.map.subscribe();
        self.player.reset();
        for ghost in &mut self.ghosts {
            ghost.reset();
        }
        self.scoreboard.reset();
        self.state = GameState::Running;
        info!(high = self.scoreboard.high, "restart");
    }

    pub fn hud(&self) -> String {
        let status = match self.state {
            GameState::Running => "arrows/wasd/hjkl move",
            GameState::Won => "cleared! r to restart",
            GameState::Lost => "caught! r to restart",
        };
        format!(
            "Score: {}  High: {}  Pellets: {}  {}  (q to quit)",
            self.scoreboard.score,
            self.scoreboard.high,
            self.map.remaining_pellets(),
            status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLoader;
    use crate::level::{COLS, ROWS, TILE_SIZE};
    use crate::render::RecordingSurface;

    fn stock_game(seed: u64) -> Game {
        let assets = AssetLoader::with_defaults(None).load().expect("assets");
        let level = LevelData::from_assets(&assets, COLS, ROWS, TILE_SIZE).expect("layout");
        let settings = Settings {
            seed: Some(seed),
            ..Settings::default()
        };
        Game::new(level, assets, &settings).expect("game")
    }

    #[test]
    fn unknown_ghost_is_a_setup_error() {
        let assets = AssetLoader::with_defaults(None).load().expect("assets");
        let level = LevelData::from_assets(&assets, COLS, ROWS, TILE_SIZE).expect("layout");
        let settings = Settings {
            ghosts: vec!["blinky".into(), "sue".into()],
            ..Settings::default()
        };
        assert!(Game::new(level, assets, &settings).is_err());
    }

    #[test]
    fn frame_draws_in_order_and_saves() {
        let mut game = stock_game(1);
        let mut surface = RecordingSurface::new();
        game.frame(&mut surface, FRAME_MS);
        assert_eq!(surface.calls.first(), Some(&crate::render::DrawCall::Clear));
        assert_eq!(surface.saved_frames, 1);
        assert_eq!(surface.arcs_with_color(Color::YELLOW), 1);
    }

    #[test]
    fn score_always_matches_the_pellets_gone() {
        let mut game = stock_game(5);
        let mut surface = RecordingSurface::new();
        for i in 0..3000 {
            if i % 90 == 0 {
                game.request_direction(Direction::CARDINAL[(i / 90) % 4]);
            }
            game.frame(&mut surface, FRAME_MS);
            assert_eq!(
                game.scoreboard().score + remaining_points(&game),
                game.map().target_score()
            );
        }
        assert!(game.scoreboard().score > 0);
    }

    fn remaining_points(game: &Game) -> u32 {
        game.map()
            .tiles()
            .iter()
            .filter_map(|t| t.pellet())
            .map(|p| p.reward)
            .sum()
    }

    #[test]
    fn high_frame_rate_settings_still_run_the_game() {
        let settings = Settings::from_lookup(|key| match key {
            "PACMAN_FPS" => Some("144".to_string()),
            "PACMAN_SEED" => Some("4".to_string()),
            _ => None,
        });
        assert_eq!(settings.fps, 144);
        let assets = AssetLoader::with_defaults(None).load().expect("assets");
        let level = LevelData::from_assets(&assets, COLS, ROWS, TILE_SIZE).expect("layout");
        let mut game = Game::new(level, assets, &settings)
            .expect("game")
            .with_ghosts(Vec::new());
        let mut surface = RecordingSurface::new();
        let gap_ms = settings.frame_micros() as f32 / 1000.0;
        let start = game.player().actor.position;

        // Three simulated seconds.
        for _ in 0..3 * settings.fps {
            game.frame(&mut surface, gap_ms);
        }
        assert!(game.player().has_started());
        assert_ne!(game.player().actor.position, start);
        assert!(game.scoreboard().score > 0);
    }

    #[test]
    fn scoreboard_keeps_the_session_high() {
        let mut board = Scoreboard::default();
        board.add(30);
        board.reset();
        board.add(10);
        assert_eq!(board, Scoreboard { score: 10, high: 30 });
    }

    #[test]
    fn power_pellet_frightens_every_ghost() {
        let mut game = stock_game(2);
        game.on_score(ScoreEvent {
            score: 50,
            target_score: 10_000,
            is_power_up: true,
        });
        assert!(game.ghosts().iter().all(Ghost::is_scared));
        assert_eq!(game.state(), GameState::Running);
    }

    #[test]
    fn restart_resets_everything_but_the_high_score() {
        let mut game = stock_game(3);
        game.on_score(ScoreEvent {
            score: 40,
            target_score: 10_000,
            is_power_up: true,
        });
        game.lose();
        game.restart();
        assert_eq!(game.state(), GameState::Running);
        assert_eq!(game.scoreboard(), Scoreboard { score: 0, high: 40 });
        assert!(game.ghosts().iter().all(|g| !g.is_scared()));
        assert!(game.hud().contains("High: 40"));
    }
}
