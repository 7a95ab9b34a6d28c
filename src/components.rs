use std::f32::consts::PI;

use crate::assets::Image;
use crate::geometry::{Solid, Vec2};
use crate::timer::{Countdown, Interval};

pub const PELLET_REWARD: u32 = 10;
pub const POWER_PELLET_REWARD: u32 = 50;
pub const PELLET_RADIUS: f32 = 3.0;
pub const POWER_PELLET_RADIUS: f32 = 7.0;
pub const WALL_IDLE_OPACITY: f32 = 0.6;
pub const WALL_FLASH_MS: f32 = 1000.0;
const PULSE_PERIOD_MS: f32 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    pub fn velocity(self, speed: f32) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -speed),
            Direction::Down => Vec2::new(0.0, speed),
            Direction::Left => Vec2::new(-speed, 0.0),
            Direction::Right => Vec2::new(speed, 0.0),
            Direction::None => Vec2::ZERO,
        }
    }

    /// Horizontal first, matching how sprites pick a facing.
    pub fn from_velocity(velocity: Vec2) -> Direction {
        if velocity.x > 0.0 {
            Direction::Right
        } else if velocity.x < 0.0 {
            Direction::Left
        } else if velocity.y > 0.0 {
            Direction::Down
        } else if velocity.y < 0.0 {
            Direction::Up
        } else {
            Direction::None
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Canvas rotation (y grows downwards) that turns a right-facing sprite.
    pub fn rotation(self) -> f32 {
        match self {
            Direction::Right | Direction::None => 0.0,
            Direction::Down => PI / 2.0,
            Direction::Left => PI,
            Direction::Up => PI * 1.5,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Direction::Up => 1,
            Direction::Down => 1 << 1,
            Direction::Left => 1 << 2,
            Direction::Right => 1 << 3,
            Direction::None => 0,
        }
    }
}

/// Small set of cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const EMPTY: DirectionSet = DirectionSet(0);
    pub const ALL: DirectionSet = DirectionSet(0b1111);

    pub fn insert(&mut self, direction: Direction) {
        self.0 |= direction.bit();
    }

    pub fn remove(&mut self, direction: Direction) {
        self.0 &= !direction.bit();
    }

    pub fn contains(&self, direction: Direction) -> bool {
        direction != Direction::None && self.0 & direction.bit() != 0
    }

    pub fn difference(self, other: DirectionSet) -> DirectionSet {
        DirectionSet(self.0 & !other.0)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in `Direction::CARDINAL` order.
    pub fn to_vec(self) -> Vec<Direction> {
        Direction::CARDINAL
            .into_iter()
            .filter(|d| self.contains(*d))
            .collect()
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::EMPTY;
        for d in iter {
            set.insert(d);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::hex(0x000000);
    pub const WHITE: Color = Color::hex(0xffffff);
    pub const YELLOW: Color = Color::hex(0xffff00);
    pub const RED: Color = Color::hex(0xff0000);
    pub const GRID: Color = Color::hex(0x666666);

    pub const fn hex(value: u32) -> Color {
        Color {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    /// Blend toward black, the backdrop every frame is cleared to.
    pub fn with_alpha(self, alpha: f32) -> Color {
        let a = alpha.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * a).round() as u8;
        Color {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }
}

/// Steps through a palette at a fixed pace.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCycle {
    colors: Vec<Color>,
    index: usize,
    pace: Interval,
}

impl ColorCycle {
    pub fn new(colors: Vec<Color>, period_ms: f32) -> Self {
        Self {
            colors,
            index: 0,
            pace: Interval::new(period_ms),
        }
    }

    pub fn advance(&mut self, dt_ms: f32) {
        let steps = self.pace.advance(dt_ms) as usize;
        if !self.colors.is_empty() {
            self.index = (self.index + steps) % self.colors.len();
        }
    }

    pub fn current(&self) -> Color {
        self.colors.get(self.index).copied().unwrap_or(Color::WHITE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    /// Glyph drawn for this wall; `None` when the asset was missing.
    pub image: Option<Image>,
    pub opacity: f32,
    pub flash: Option<Countdown>,
}

impl Wall {
    pub fn new(image: Option<Image>) -> Self {
        Self {
            image,
            opacity: WALL_IDLE_OPACITY,
            flash: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PelletKind {
    Normal,
    Power,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pellet {
    pub kind: PelletKind,
    pub reward: u32,
    pub radius: f32,
    pub eaten: bool,
}

impl Pellet {
    pub fn normal() -> Self {
        Self {
            kind: PelletKind::Normal,
            reward: PELLET_REWARD,
            radius: PELLET_RADIUS,
            eaten: false,
        }
    }

    pub fn power() -> Self {
        Self {
            kind: PelletKind::Power,
            reward: POWER_PELLET_REWARD,
            radius: POWER_PELLET_RADIUS,
            eaten: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tile {
    Empty,
    Wall(Wall),
    Pellet(Pellet),
    PowerPellet { pellet: Pellet, pulse: ColorCycle },
}

impl Tile {
    pub fn power_pellet() -> Self {
        Tile::PowerPellet {
            pellet: Pellet::power(),
            pulse: ColorCycle::new(
                vec![
                    Color::hex(0xffb8ae),
                    Color::hex(0xffffff),
                    Color::hex(0xffb8ae),
                    Color::hex(0x7f5c57),
                ],
                PULSE_PERIOD_MS,
            ),
        }
    }

    pub fn pellet(&self) -> Option<&Pellet> {
        match self {
            Tile::Pellet(p) | Tile::PowerPellet { pellet: p, .. } => Some(p),
            _ => None,
        }
    }

    pub fn pellet_mut(&mut self) -> Option<&mut Pellet> {
        match self {
            Tile::Pellet(p) | Tile::PowerPellet { pellet: p, .. } => Some(p),
            _ => None,
        }
    }
}

impl Solid for Tile {
    fn solid(&self) -> bool {
        matches!(self, Tile::Wall(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for d in Direction::CARDINAL {
            assert_ne!(d, d.opposite());
            assert_eq!(d, d.opposite().opposite());
        }
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn direction_set_ignores_none() {
        let mut set = DirectionSet::EMPTY;
        set.insert(Direction::None);
        assert!(set.is_empty());
        set.insert(Direction::Left);
        set.insert(Direction::Up);
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_vec(), vec![Direction::Up, Direction::Left]);
        assert_eq!(
            DirectionSet::ALL.difference(set).to_vec(),
            vec![Direction::Down, Direction::Right]
        );
    }

    #[test]
    fn facing_prefers_horizontal_motion() {
        assert_eq!(Direction::from_velocity(Vec2::new(2.0, -2.0)), Direction::Right);
        assert_eq!(Direction::from_velocity(Vec2::new(0.0, -2.0)), Direction::Up);
        assert_eq!(Direction::from_velocity(Vec2::ZERO), Direction::None);
    }

    #[test]
    fn only_walls_are_solid() {
        assert!(Tile::Wall(Wall::new(None)).solid());
        assert!(!Tile::Empty.solid());
        assert!(!Tile::Pellet(Pellet::normal()).solid());
        assert!(!Tile::power_pellet().solid());
    }

    #[test]
    fn hex_colors_split_into_channels() {
        let c = Color::hex(0x12ab34);
        assert_eq!((c.r, c.g, c.b), (0x12, 0xab, 0x34));
        assert_eq!(Color::WHITE.with_alpha(0.5), Color::hex(0x808080));
    }
}
