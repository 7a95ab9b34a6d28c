//! Drawing surface contract and the sprites drawn onto it.

use std::f32::consts::{PI, TAU};

use crate::assets::Image;
use crate::components::{Color, Direction, Tile};
use crate::geometry::{Rect, Vec2};
use crate::ghost::Ghost;
use crate::player::Player;
use crate::tilemap::Tilemap;

const BANNER_FIRST_LINE_Y: f32 = 200.0;
const BANNER_LINE_GAP: f32 = 60.0;

/// 2D drawing context in maze pixels, y growing downwards.
pub trait Surface {
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);
    fn set_alpha(&mut self, alpha: f32);
    fn draw_image(&mut self, image: &Image, rect: Rect);
    fn fill_arc(&mut self, center: Vec2, radius: f32, start: f32, end: f32, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color);
    /// `at` is the horizontal center of the text.
    fn fill_text(&mut self, text: &str, at: Vec2, color: Color);
    /// Keep the current frame so it can be put back after a resize.
    fn save_frame(&mut self);
    fn restore_frame(&mut self);
}

/// Affine transform `[a c e; b d f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translated(self, x: f32, y: f32) -> Self {
        Self {
            e: self.a * x + self.c * y + self.e,
            f: self.b * x + self.d * y + self.f,
            ..self
        }
    }

    pub fn rotated(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..self
        }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn angle(&self) -> f32 {
        self.b.atan2(self.a)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    Image { glyph: String, rect: Rect, alpha: f32 },
    Arc { center: Vec2, radius: f32, start: f32, end: f32, color: Color },
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color },
    Text { text: String, at: Vec2, color: Color },
}

/// Headless surface that records every call with the transform applied.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<DrawCall>,
    pub saved_frames: usize,
    stack: Vec<(Transform, f32)>,
    transform: Transform,
    alpha: f32,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            alpha: 1.0,
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn arcs_with_color(&self, color: Color) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Arc { color: c, .. } if *c == color))
            .count()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.calls.clear();
        self.calls.push(DrawCall::Clear);
    }

    fn save(&mut self) {
        self.stack.push((self.transform, self.alpha));
    }

    fn restore(&mut self) {
        if let Some((transform, alpha)) = self.stack.pop() {
            self.transform = transform;
            self.alpha = alpha;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.transform = self.transform.translated(x, y);
    }

    fn rotate(&mut self, angle: f32) {
        self.transform = self.transform.rotated(angle);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    fn draw_image(&mut self, image: &Image, rect: Rect) {
        let origin = self.transform.apply(Vec2::new(rect.x, rect.y));
        self.calls.push(DrawCall::Image {
            glyph: image.glyph.clone(),
            rect: Rect::at(origin, rect.width, rect.height),
            alpha: self.alpha,
        });
    }

    fn fill_arc(&mut self, center: Vec2, radius: f32, start: f32, end: f32, color: Color) {
        let turn = self.transform.angle();
        self.calls.push(DrawCall::Arc {
            center: self.transform.apply(center),
            radius,
            start: start + turn,
            end: end + turn,
            color,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let origin = self.transform.apply(Vec2::new(rect.x, rect.y));
        self.calls.push(DrawCall::FillRect {
            rect: Rect::at(origin, rect.width, rect.height),
            color,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        let origin = self.transform.apply(Vec2::new(rect.x, rect.y));
        self.calls.push(DrawCall::StrokeRect {
            rect: Rect::at(origin, rect.width, rect.height),
            color,
        });
    }

    fn fill_text(&mut self, text: &str, at: Vec2, color: Color) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            at: self.transform.apply(at),
            color,
        });
    }

    fn save_frame(&mut self) {
        self.saved_frames += 1;
    }

    fn restore_frame(&mut self) {}
}

pub fn draw_tilemap<S: Surface + ?Sized>(surface: &mut S, map: &Tilemap) {
    surface.save();
    for (index, tile) in map.tiles().iter().enumerate() {
        let rect = map.tile_rect(index);
        match tile {
            Tile::Empty => {}
            Tile::Wall(wall) => {
                // Walls whose image failed to resolve are still solid, just invisible.
                if let Some(image) = &wall.image {
                    surface.set_alpha(wall.opacity);
                    surface.draw_image(image, rect);
                    surface.set_alpha(1.0);
                }
            }
            Tile::Pellet(pellet) => {
                surface.fill_arc(rect.center(), pellet.radius, 0.0, TAU, Color::WHITE);
            }
            Tile::PowerPellet { pellet, pulse } => {
                surface.fill_arc(rect.center(), pellet.radius, 0.0, TAU, pulse.current());
            }
        }
        if map.draw_grid_lines {
            surface.stroke_rect(rect, Color::GRID);
        }
    }
    surface.restore();
}

pub fn draw_player<S: Surface + ?Sized>(surface: &mut S, player: &Player, debug: bool) {
    let center = player.actor.center();
    surface.save();
    surface.translate(center.x, center.y);
    surface.rotate(player.rotation);
    surface.translate(-center.x, -center.y);
    surface.fill_arc(
        center,
        player.actor.radius,
        player.mouth_gap,
        TAU - player.mouth_gap,
        player.color,
    );
    surface.restore();

    if debug {
        surface.stroke_rect(player.actor.bounds(), Color::RED);
    }
}

pub fn draw_ghost<S: Surface + ?Sized>(surface: &mut S, ghost: &Ghost, debug: bool) {
    let (body, face) = ghost.colors();
    let center = ghost.actor.center();
    let r = ghost.actor.radius;

    surface.fill_arc(center, r, PI, TAU, body);
    surface.fill_rect(Rect::new(center.x - r, center.y, r * 2.0, r), body);

    let look = match ghost.facing {
        Direction::None => Vec2::ZERO,
        d => d.velocity(r * 0.15),
    };
    for side in [-1.0, 1.0] {
        let eye = Vec2::new(center.x + side * r * 0.4, center.y - r * 0.2);
        surface.fill_arc(eye, r * 0.3, 0.0, TAU, face);
        surface.fill_arc(eye + look, r * 0.15, 0.0, TAU, ghost.pupil_color());
    }

    if debug {
        surface.stroke_rect(ghost.actor.bounds(), Color::RED);
    }
}

/// Two centered lines with an offset shadow, like the end-of-game screens.
pub fn draw_banner<S: Surface + ?Sized>(
    surface: &mut S,
    width: f32,
    lines: [&str; 2],
    color: Color,
    shadow: Color,
) {
    surface.save();
    for (i, line) in lines.iter().enumerate() {
        let at = Vec2::new(width / 2.0, BANNER_FIRST_LINE_Y + i as f32 * BANNER_LINE_GAP);
        surface.fill_text(line, at + Vec2::new(7.0, 7.0), shadow);
        surface.fill_text(line, at, color);
    }
    surface.restore();
}
