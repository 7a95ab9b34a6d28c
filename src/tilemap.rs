use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, info, warn};

use crate::assets::Assets;
use crate::components::{
    Direction, Pellet, PelletKind, Tile, Wall, WALL_FLASH_MS, WALL_IDLE_OPACITY,
};
use crate::geometry::{Rect, Vec2};
use crate::level::{LevelData, MazeToken};
use crate::motion::Actor;
use crate::timer::Countdown;

/// Emitted once per consumed pellet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEvent {
    pub score: u32,
    pub target_score: u32,
    pub is_power_up: bool,
}

/// Row-major grid of tiles, `index = row * cols + col`.
#[derive(Debug)]
pub struct Tilemap {
    pub cols: usize,
    pub rows: usize,
    pub size: f32,
    pub draw_grid_lines: bool,
    tiles: Vec<Tile>,
    target_score: u32,
    sinks: Vec<Sender<ScoreEvent>>,
}

impl Tilemap {
    /// Materialises `level` into tiles and fixes the target score.
    pub fn setup(level: &LevelData, assets: &Assets) -> Self {
        let mut target_score = 0;
        let tiles: Vec<Tile> = level
            .tokens
            .iter()
            .enumerate()
            .map(|(index, token)| match *token {
                MazeToken::Floor => Tile::Empty,
                MazeToken::Pellet => Tile::Pellet(Pellet::normal()),
                MazeToken::PowerPellet => Tile::power_pellet(),
                MazeToken::Wall(key) => {
                    let image = assets.image(&key.to_string()).cloned();
                    if image.is_none() {
                        warn!(index, token = %key, "no image for wall token");
                    }
                    Tile::Wall(Wall::new(image))
                }
            })
            .inspect(|tile| {
                if let Some(p) = tile.pellet() {
                    target_score += p.reward;
                }
            })
            .collect();

        info!(
            cols = level.cols,
            rows = level.rows,
            target_score,
            "tilemap ready"
        );
        Self {
            cols: level.cols,
            rows: level.rows,
            size: level.size,
            draw_grid_lines: false,
            tiles,
            target_score,
            sinks: Vec::new(),
        }
    }

    /// Registers a listener for score events.
    pub fn subscribe(&mut self) -> Receiver<ScoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.sinks.push(tx);
        rx
    }

    pub fn target_score(&self) -> u32 {
        self.target_score
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Cell index for continuous coordinates, `None` outside the grid.
    pub fn index_at(&self, x: f32, y: f32) -> Option<usize> {
        let col = (x / self.size).floor();
        let row = (y / self.size).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(row * self.cols + col)
    }

    pub fn get_tile(&self, x: f32, y: f32) -> Option<&Tile> {
        self.index_at(x, y).and_then(|i| self.tile(i))
    }

    pub fn tile_rect(&self, index: usize) -> Rect {
        let col = (index % self.cols) as f32;
        let row = (index / self.cols) as f32;
        Rect::new(col * self.size, row * self.size, self.size, self.size)
    }

    pub fn remaining_pellets(&self) -> usize {
        self.tiles.iter().filter(|t| t.pellet().is_some()).count()
    }

    /// Eats the pellet in the cell `actor` is moving into, if its center is
    /// closer than the actor's radius.
    pub fn consume_pellet_if_overlapping(&mut self, actor: &Actor) -> Option<ScoreEvent> {
        let (x, y) = (actor.position.x, actor.position.y);
        let s = actor.speed;
        let point = match actor.direction {
            Direction::Up => Vec2::new(x, y + s),
            Direction::Left => Vec2::new(x + s, y),
            Direction::Down => Vec2::new(x, y + actor.height - s),
            Direction::Right => Vec2::new(x + actor.width - s, y),
            Direction::None => return None,
        };
        let index = self.index_at(point.x, point.y)?;
        let center = self.tile_rect(index).center();
        let tile = self.tiles.get_mut(index)?;
        let pellet = tile.pellet_mut()?;
        if pellet.eaten || actor.center().distance(center) >= actor.radius {
            return None;
        }
        pellet.eaten = true;
        let event = ScoreEvent {
            score: pellet.reward,
            target_score: self.target_score,
            is_power_up: pellet.kind == PelletKind::Power,
        };
        self.tiles[index] = Tile::Empty;
        debug!(index, reward = event.score, power = event.is_power_up, "pellet eaten");

        self.sinks.retain(|tx| tx.send(event).is_ok());
        Some(event)
    }

    /// Lights up the wall at `(x, y)` for a moment.
    pub fn flash_wall_at(&mut self, x: f32, y: f32) {
        let Some(index) = self.index_at(x, y) else {
            return;
        };
        if let Some(Tile::Wall(wall)) = self.tiles.get_mut(index) {
            wall.opacity = 1.0;
            wall.flash = Some(Countdown::new(WALL_FLASH_MS));
        }
    }

    /// Advances wall flashes and power-pellet pulses.
    pub fn tick(&mut self, dt_ms: f32) {
        for tile in &mut self.tiles {
            match tile {
                Tile::Wall(wall) => {
                    let expired = wall.flash.as_mut().is_some_and(|f| f.advance(dt_ms));
                    if expired {
                        wall.flash = None;
                        wall.opacity = WALL_IDLE_OPACITY;
                    }
                }
                Tile::PowerPellet { pulse, .. } => pulse.advance(dt_ms),
                _ => {}
            }
        }
    }
}
