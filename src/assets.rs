//! Name → resource provider, filled by a single bulk load before play.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info};

use crate::components::Color;
use crate::error::{GameError, GameResult};

pub const MAZE_ASSET: &str = "maze";

/// Layout shipped with the binary.
pub const DEFAULT_MAZE: &str = include_str!("../assets/maze.json");

const WALL_BLUE: Color = Color::hex(0x2121ff);

/// Wall glyphs keyed by their maze token.
const WALL_GLYPHS: [(&str, &str); 16] = [
    ("-", "══"),
    ("|", "║ "),
    ("1", "╔═"),
    ("2", "╗ "),
    ("3", "╝ "),
    ("4", "╚═"),
    ("5", "╦═"),
    ("6", "╣ "),
    ("7", "╩═"),
    ("8", "╠═"),
    ("b", "██"),
    ("[", "╞═"),
    ("]", "═╡"),
    ("_", "╨ "),
    ("^", "╥ "),
    ("+", "╬═"),
];

/// A drawable glyph image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub glyph: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetData {
    Image(Image),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub data: AssetData,
}

impl Asset {
    pub fn image(&self) -> Option<&Image> {
        match &self.data {
            AssetData::Image(image) => Some(image),
            AssetData::Json(_) => None,
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.data {
            AssetData::Json(value) => Some(value),
            AssetData::Image(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AssetSource {
    InlineJson(String),
    JsonFile(PathBuf),
    Glyph(Image),
}

#[derive(Debug, Default)]
pub struct AssetLoader {
    queue: Vec<(String, AssetSource)>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maze layout plus every wall glyph.
    pub fn with_defaults(maze: Option<PathBuf>) -> Self {
        let maze = match maze {
            Some(path) => AssetSource::JsonFile(path),
            None => AssetSource::InlineJson(DEFAULT_MAZE.to_string()),
        };
        let mut loader = Self::new().add(MAZE_ASSET, maze);
        for (token, glyph) in WALL_GLYPHS {
            loader = loader.add(
                token,
                AssetSource::Glyph(Image {
                    glyph: glyph.to_string(),
                    color: WALL_BLUE,
                }),
            );
        }
        loader
    }

    pub fn add(mut self, name: impl Into<String>, source: AssetSource) -> Self {
        self.queue.push((name.into(), source));
        self
    }

    /// Loads everything or nothing: the first failure aborts.
    pub fn load(self) -> GameResult<Assets> {
        let total = self.queue.len();
        let mut entries = HashMap::with_capacity(total);
        for (name, source) in self.queue {
            let data = load_one(&name, source)?;
            debug!(asset = %name, "loaded asset");
            entries.insert(name.clone(), Asset { name, data });
        }
        info!(count = total, "assets ready");
        Ok(Assets { entries })
    }
}

fn load_one(name: &str, source: AssetSource) -> GameResult<AssetData> {
    let fail = |reason: String| GameError::AssetLoad {
        name: name.to_string(),
        reason,
    };
    match source {
        AssetSource::InlineJson(text) => serde_json::from_str(&text)
            .map(AssetData::Json)
            .map_err(|e| fail(e.to_string())),
        AssetSource::JsonFile(path) => {
            let text =
                fs::read_to_string(&path).map_err(|e| fail(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&text)
                .map(AssetData::Json)
                .map_err(|e| fail(e.to_string()))
        }
        AssetSource::Glyph(image) => Ok(AssetData::Image(image)),
    }
}

#[derive(Debug, Default, Clone)]
pub struct Assets {
    entries: HashMap<String, Asset>,
}

impl Assets {
    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.entries.get(name)
    }

    pub fn image(&self, name: &str) -> Option<&Image> {
        self.get(name).and_then(Asset::image)
    }

    pub fn json(&self, name: &str) -> GameResult<&Value> {
        self.get(name)
            .and_then(Asset::json)
            .ok_or_else(|| GameError::MissingAsset(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_loads_maze_and_walls() {
        let assets = AssetLoader::with_defaults(None).load().expect("defaults load");
        assert_eq!(assets.len(), WALL_GLYPHS.len() + 1);
        assert!(assets.json(MAZE_ASSET).expect("maze").is_array());
        assert_eq!(assets.image("b").map(|i| i.glyph.as_str()), Some("██"));
        assert!(assets.image(".").is_none());
    }

    #[test]
    fn first_failure_aborts_the_load() {
        let result = AssetLoader::new()
            .add("ok", AssetSource::InlineJson("[1]".into()))
            .add("broken", AssetSource::InlineJson("[1,".into()))
            .load();
        match result {
            Err(GameError::AssetLoad { name, .. }) => assert_eq!(name, "broken"),
            other => panic!("expected load failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_layout_file_is_reported() {
        let result = AssetLoader::new()
            .add(MAZE_ASSET, AssetSource::JsonFile("/definitely/not/here.json".into()))
            .load();
        assert!(matches!(result, Err(GameError::AssetLoad { .. })));
    }
}
