use serde_json::Value;
use tracing::info;

use crate::assets::{Assets, MAZE_ASSET};
use crate::error::{GameError, GameResult};

pub const COLS: usize = 11;
pub const ROWS: usize = 13;
pub const TILE_SIZE: f32 = 40.0;
pub const PLAYER_START: (usize, usize) = (5, 8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MazeToken {
    Pellet,
    PowerPellet,
    Floor,
    /// Wall drawn with the image registered under this character.
    Wall(char),
}

impl MazeToken {
    fn parse(index: usize, token: &str) -> GameResult<MazeToken> {
        let mut chars = token.chars();
        let token = match (chars.next(), chars.next()) {
            (None, _) | (Some(' '), None) => MazeToken::Floor,
            (Some('.'), None) => MazeToken::Pellet,
            (Some('p' | 'P'), None) => MazeToken::PowerPellet,
            (Some(c), None) => MazeToken::Wall(c),
            _ => {
                return Err(GameError::LayoutToken {
                    index,
                    token: token.to_string(),
                })
            }
        };
        Ok(token)
    }
}

/// Decoded maze layout. Dimensions come from the caller, not the document.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub cols: usize,
    pub rows: usize,
    pub size: f32,
    pub tokens: Vec<MazeToken>,
    pub player_start: (usize, usize),
}

impl LevelData {
    pub fn from_assets(assets: &Assets, cols: usize, rows: usize, size: f32) -> GameResult<Self> {
        Self::from_json(assets.json(MAZE_ASSET)?, cols, rows, size)
    }

    pub fn from_json(value: &Value, cols: usize, rows: usize, size: f32) -> GameResult<Self> {
        let raw: Vec<String> = serde_json::from_value(value.clone())?;
        let expected = cols * rows;
        if raw.len() != expected {
            return Err(GameError::LayoutSize {
                expected,
                found: raw.len(),
                cols,
                rows,
            });
        }
        let tokens = raw
            .iter()
            .enumerate()
            .map(|(i, t)| MazeToken::parse(i, t))
            .collect::<GameResult<Vec<_>>>()?;
        info!(cols, rows, size, "maze layout decoded");
        Ok(Self {
            cols,
            rows,
            size,
            tokens,
            player_start: PLAYER_START,
        })
    }

    /// Builds a layout from text rows, one character per tile.
    pub fn from_rows(rows: &[&str], size: f32) -> GameResult<Self> {
        let cols = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let tokens: Vec<Value> = rows
            .iter()
            .flat_map(|r| r.chars())
            .map(|c| Value::String(c.to_string()))
            .collect();
        Self::from_json(&Value::Array(tokens), cols, rows.len(), size)
    }

    pub fn with_player_start(mut self, col: usize, row: usize) -> Self {
        self.player_start = (col, row);
        self
    }

    pub fn pellet_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, MazeToken::Pellet | MazeToken::PowerPellet))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLoader;

    #[test]
    fn embedded_layout_matches_default_dimensions() {
        let assets = AssetLoader::with_defaults(None).load().expect("assets");
        let level = LevelData::from_assets(&assets, COLS, ROWS, TILE_SIZE).expect("layout");
        assert_eq!(level.tokens.len(), COLS * ROWS);
        assert_eq!(level.tokens[0], MazeToken::Wall('1'));
        assert_eq!(level.tokens[COLS + 1], MazeToken::PowerPellet);
        let (col, row) = level.player_start;
        assert_eq!(level.tokens[row * COLS + col], MazeToken::Pellet);
    }

    #[test]
    fn token_meanings() {
        let level = LevelData::from_rows(&["b.pP -"], 40.0).expect("layout");
        assert_eq!(
            level.tokens,
            vec![
                MazeToken::Wall('b'),
                MazeToken::Pellet,
                MazeToken::PowerPellet,
                MazeToken::PowerPellet,
                MazeToken::Floor,
                MazeToken::Wall('-'),
            ]
        );
        assert_eq!(level.pellet_count(), 3);
    }

    #[test]
    fn empty_token_is_floor() {
        let value = serde_json::json!(["", "."]);
        let level = LevelData::from_json(&value, 2, 1, 40.0).expect("layout");
        assert_eq!(level.tokens[0], MazeToken::Floor);
    }

    #[test]
    fn wrong_token_count_is_rejected() {
        let value = serde_json::json!([".", "."]);
        let err = LevelData::from_json(&value, 3, 1, 40.0).unwrap_err();
        assert!(matches!(err, GameError::LayoutSize { expected: 3, found: 2, .. }));
    }

    #[test]
    fn multi_character_tokens_are_rejected() {
        let value = serde_json::json!(["..", "."]);
        let err = LevelData::from_json(&value, 2, 1, 40.0).unwrap_err();
        assert!(matches!(err, GameError::LayoutToken { index: 0, .. }));
    }

    #[test]
    fn non_array_layout_is_a_json_error() {
        let value = serde_json::json!({ "maze": [] });
        let err = LevelData::from_json(&value, 1, 1, 40.0).unwrap_err();
        assert!(matches!(err, GameError::Json(_)));
    }
}
