use std::env;
use std::path::PathBuf;

use serde::Serialize;

use crate::ghost::{GhostKind, FRIGHT_MS};

pub const DEFAULT_FPS: u64 = 60;
pub const DEFAULT_LOG_FILE: &str = "pacman.log";

/// Runtime knobs read from `PACMAN_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub fps: u64,
    pub maze: Option<PathBuf>,
    pub seed: Option<u64>,
    pub fright_ms: f32,
    pub debug_grid: bool,
    pub log_file: PathBuf,
    pub ghosts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            maze: None,
            seed: None,
            fright_ms: FRIGHT_MS,
            debug_grid: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            ghosts: GhostKind::ROSTER.iter().map(|k| k.name().to_string()).collect(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparseable or out-of-range values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let fps = lookup("PACMAN_FPS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.fps);
        let maze = lookup("PACMAN_MAZE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let seed = lookup("PACMAN_SEED").and_then(|v| v.parse::<u64>().ok());
        let fright_ms = lookup("PACMAN_FRIGHT_MS")
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(defaults.fright_ms);
        let debug_grid = lookup("PACMAN_DEBUG_GRID")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.debug_grid);
        let log_file = lookup("PACMAN_LOG")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.log_file);
        let ghosts = lookup("PACMAN_GHOSTS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.ghosts);

        Self {
            fps,
            maze,
            seed,
            fright_ms,
            debug_grid,
            log_file,
            ghosts,
        }
    }

    pub fn frame_micros(&self) -> u64 {
        1_000_000 / self.fps.max(1)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let s = settings(&[]);
        assert_eq!(s, Settings::default());
        assert_eq!(s.ghosts, vec!["blinky", "pinky", "inky", "clyde"]);
        assert_eq!(s.frame_micros(), 16_666);
    }

    #[test]
    fn values_are_parsed() {
        let s = settings(&[
            ("PACMAN_FPS", "30"),
            ("PACMAN_MAZE", "levels/small.json"),
            ("PACMAN_SEED", "42"),
            ("PACMAN_FRIGHT_MS", "2500"),
            ("PACMAN_DEBUG_GRID", "1"),
            ("PACMAN_LOG", "/tmp/pac.log"),
            ("PACMAN_GHOSTS", "inky, clyde"),
        ]);
        assert_eq!(s.fps, 30);
        assert_eq!(s.maze, Some(PathBuf::from("levels/small.json")));
        assert_eq!(s.seed, Some(42));
        assert_eq!(s.fright_ms, 2500.0);
        assert!(s.debug_grid);
        assert_eq!(s.log_file, PathBuf::from("/tmp/pac.log"));
        assert_eq!(s.ghosts, vec!["inky", "clyde"]);
    }

    #[test]
    fn bad_values_fall_back() {
        let s = settings(&[
            ("PACMAN_FPS", "0"),
            ("PACMAN_SEED", "many"),
            ("PACMAN_FRIGHT_MS", "-5"),
            ("PACMAN_DEBUG_GRID", "nope"),
            ("PACMAN_MAZE", "  "),
        ]);
        assert_eq!(s.fps, DEFAULT_FPS);
        assert_eq!(s.seed, None);
        assert_eq!(s.fright_ms, FRIGHT_MS);
        assert!(!s.debug_grid);
        assert_eq!(s.maze, None);
    }

    #[test]
    fn high_frame_rates_are_accepted() {
        let s = settings(&[("PACMAN_FPS", "144")]);
        assert_eq!(s.fps, 144);
        assert_eq!(s.frame_micros(), 6_944);
    }

    #[test]
    fn serializes_for_the_startup_log() {
        let json = serde_json::to_value(Settings::default()).expect("serialize");
        assert_eq!(json["fps"], 60);
        assert_eq!(json["log_file"], DEFAULT_LOG_FILE);
    }
}
