//! Tile-maze Pac-Man: grid-aligned actor movement, ghost fright timing and
//! pellet scoring, drawn through a small surface abstraction.

pub mod assets;
pub mod components;
pub mod config;
pub mod error;
pub mod game;
pub mod geometry;
pub mod ghost;
pub mod level;
pub mod motion;
pub mod player;
pub mod render;
pub mod terminal;
pub mod tilemap;
pub mod timer;

pub use error::{GameError, GameResult};
pub use game::{Game, GameState};
