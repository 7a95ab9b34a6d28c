//! Ghosts: roster, frightened state machine and autonomous movement.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::components::{Color, Direction};
use crate::error::GameError;
use crate::geometry::Vec2;
use crate::motion::{integrate, steer, Actor};
use crate::tilemap::Tilemap;
use crate::timer::{Countdown, Interval};

pub const GHOST_SPEED: f32 = 2.0;
pub const FRIGHT_MS: f32 = 5000.0;
const FLASH_PERIOD_MS: f32 = 250.0;
const TIMER_SLACK_MS: f32 = 0.01;
const FRIGHT_BODY: Color = Color::hex(0x2121ff);
const FRIGHT_FACE: Color = Color::hex(0xffb8ae);
const PUPIL: Color = Color::hex(0x2121ff);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GhostKind {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostKind {
    pub const ROSTER: [GhostKind; 4] = [
        GhostKind::Blinky,
        GhostKind::Pinky,
        GhostKind::Inky,
        GhostKind::Clyde,
    ];

    pub fn color(self) -> Color {
        match self {
            GhostKind::Blinky => Color::RED,
            GhostKind::Pinky => Color::hex(0xffb8ff),
            GhostKind::Inky => Color::hex(0x00ffff),
            GhostKind::Clyde => Color::hex(0xffb852),
        }
    }

    /// Spawn cell on the stock maze.
    pub fn start_tile(self) -> (usize, usize) {
        match self {
            GhostKind::Blinky => (5, 5),
            GhostKind::Pinky => (1, 5),
            GhostKind::Inky => (9, 5),
            GhostKind::Clyde => (5, 11),
        }
    }

    pub fn start_delay_ms(self) -> f32 {
        match self {
            GhostKind::Blinky => 1500.0,
            GhostKind::Pinky => 3000.0,
            GhostKind::Inky => 4500.0,
            GhostKind::Clyde => 6000.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GhostKind::Blinky => "blinky",
            GhostKind::Pinky => "pinky",
            GhostKind::Inky => "inky",
            GhostKind::Clyde => "clyde",
        }
    }
}

impl fmt::Display for GhostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GhostKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        GhostKind::ROSTER
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GameError::UnknownGhost(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostMode {
    Normal,
    Frightened,
    /// Last third of the frightened time, colors alternating.
    FrightenedFlashing,
}

#[derive(Debug, Clone, PartialEq)]
struct Fright {
    elapsed_ms: f32,
    flash: Option<Interval>,
    flash_on: bool,
}

#[derive(Debug, Clone)]
pub struct Ghost {
    pub kind: GhostKind,
    pub actor: Actor,
    /// Last non-zero travel direction, for the eyes.
    pub facing: Direction,
    mode: GhostMode,
    fright: Option<Fright>,
    fright_ms: f32,
    start_delay_ms: f32,
    start: Option<Countdown>,
    spawn: Vec2,
}

impl Ghost {
    pub fn new(kind: GhostKind, size: f32) -> Self {
        let (col, row) = kind.start_tile();
        let spawn = Vec2::new(col as f32 * size, row as f32 * size);
        let start_delay_ms = kind.start_delay_ms();
        Self {
            kind,
            actor: Actor::new(spawn, size, GHOST_SPEED),
            facing: Direction::None,
            mode: GhostMode::Normal,
            fright: None,
            fright_ms: FRIGHT_MS,
            start_delay_ms,
            start: Some(Countdown::new(start_delay_ms)),
            spawn,
        }
    }

    pub fn at_tile(mut self, col: usize, row: usize) -> Self {
        let size = self.actor.width;
        self.spawn = Vec2::new(col as f32 * size, row as f32 * size);
        self.actor.position = self.spawn;
        self
    }

    pub fn with_start_delay(mut self, ms: f32) -> Self {
        self.start_delay_ms = ms;
        self.start = Some(Countdown::new(ms));
        self
    }

    pub fn with_fright_duration(mut self, ms: f32) -> Self {
        self.fright_ms = ms;
        self
    }

    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    pub fn is_scared(&self) -> bool {
        self.mode != GhostMode::Normal
    }

    pub fn has_started(&self) -> bool {
        self.start.is_none()
    }

    /// Power pellet eaten. Restarts the clock when already frightened.
    pub fn enter_frightened(&mut self) {
        self.mode = GhostMode::Frightened;
        self.fright = Some(Fright {
            elapsed_ms: 0.0,
            flash: None,
            flash_on: false,
        });
        debug!(ghost = %self.kind, "frightened");
    }

    pub fn tick_frightened(&mut self, dt_ms: f32) {
        let Some(fright) = self.fright.as_mut() else {
            return;
        };
        fright.elapsed_ms += dt_ms;
        // Summed frame times drift a little below whole milliseconds.
        if fright.elapsed_ms + TIMER_SLACK_MS >= self.fright_ms {
            self.fright = None;
            self.mode = GhostMode::Normal;
            debug!(ghost = %self.kind, "fright over");
            return;
        }

        if let Some(flash) = fright.flash.as_mut() {
            if flash.advance(dt_ms) % 2 == 1 {
                fright.flash_on = !fright.flash_on;
            }
        } else if fright.elapsed_ms * 3.0 >= self.fright_ms * 2.0 {
            fright.flash = Some(Interval::new(FLASH_PERIOD_MS));
            fright.flash_on = true;
            self.mode = GhostMode::FrightenedFlashing;
        }
    }

    /// `(body, face)` for the current state.
    pub fn colors(&self) -> (Color, Color) {
        match (&self.fright, self.mode) {
            (Some(f), GhostMode::FrightenedFlashing) if f.flash_on => (Color::WHITE, Color::RED),
            (Some(_), _) => (FRIGHT_BODY, FRIGHT_FACE),
            (None, _) => (self.kind.color(), Color::WHITE),
        }
    }

    pub fn pupil_color(&self) -> Color {
        if self.is_scared() {
            self.colors().1
        } else {
            PUPIL
        }
    }

    pub fn update<R: Rng + ?Sized>(&mut self, map: &Tilemap, dt: f32, dt_ms: f32, rng: &mut R) {
        self.tick_frightened(dt_ms);

        if let Some(start) = self.start.as_mut() {
            if start.advance(dt_ms) {
                self.start = None;
                let first = Direction::CARDINAL
                    .choose(rng)
                    .copied()
                    .unwrap_or(Direction::Left);
                self.actor.set_direction(first);
                info!(ghost = %self.kind, direction = ?first, "ghost released");
            }
            return;
        }

        if let Some(turn) = steer(&mut self.actor, map, rng) {
            debug!(ghost = %self.kind, direction = ?turn, "ghost turned");
        }
        integrate(&mut self.actor, dt);
        if self.actor.is_moving() {
            self.facing = Direction::from_velocity(self.actor.velocity);
        }
    }

    pub fn freeze(&mut self) {
        self.actor.freeze();
    }

    /// Back to the spawn cell in Normal mode with every timer dropped.
    pub fn reset(&mut self) {
        let size = self.actor.width;
        self.actor = Actor::new(self.spawn, size, GHOST_SPEED);
        self.facing = Direction::None;
        self.mode = GhostMode::Normal;
        self.fright = None;
        self.start = Some(Countdown::new(self.start_delay_ms));
    }
}

/// Ghosts for the given identifiers, in order.
pub fn roster<S: AsRef<str>>(names: &[S], size: f32, fright_ms: f32) -> Result<Vec<Ghost>, GameError> {
    names
        .iter()
        .map(|name| {
            let kind: GhostKind = name.as_ref().parse()?;
            Ok(Ghost::new(kind, size).with_fright_duration(fright_ms))
        })
        .collect()
}
