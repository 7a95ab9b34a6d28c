//! Character-cell rendition of the drawing surface for a raw-mode terminal.
//!
//! Every maze tile becomes one cell, `CELL_W` columns wide. Shapes are
//! classified into glyphs as they are drawn; a higher layer wins when two
//! shapes land in the same cell.

use std::f32::consts::{PI, TAU};
use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{self, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthStr;

use crate::assets::Image;
use crate::components::{Color, Direction};
use crate::geometry::{Rect, Vec2};
use crate::render::{Surface, Transform};

pub const CELL_W: usize = 2;
const ARC_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub enum Glyph {
    Empty,
    Grid,
    Dot,
    Power,
    Wall(String),
    Block,
    Skirt,
    Ghost,
    Pacman(Direction),
    PacmanClosed,
    Label(String),
}

impl Glyph {
    fn layer(&self) -> u8 {
        match self {
            Glyph::Empty | Glyph::Grid => 0,
            Glyph::Dot => 1,
            Glyph::Power | Glyph::Wall(_) | Glyph::Block => 2,
            Glyph::Skirt => 3,
            Glyph::Ghost => 4,
            Glyph::Pacman(_) | Glyph::PacmanClosed => 5,
            Glyph::Label(_) => 6,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Glyph::Empty => "  ",
            Glyph::Grid => "· ",
            Glyph::Dot => "· ",
            Glyph::Power => "● ",
            Glyph::Wall(glyph) | Glyph::Label(glyph) => glyph.as_str(),
            Glyph::Block => "██",
            Glyph::Skirt => "▀▀",
            Glyph::Ghost => "ᗣ",
            Glyph::Pacman(Direction::Left) => "ᗤ",
            Glyph::Pacman(Direction::Up) => "ᗢ",
            Glyph::Pacman(Direction::Down) => "ᗜ",
            Glyph::Pacman(_) => "ᗧ",
            Glyph::PacmanClosed => "●",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub glyph: Glyph,
    pub color: Color,
}

impl Cell {
    const BLANK: Cell = Cell {
        glyph: Glyph::Empty,
        color: Color::BLACK,
    };
}

pub struct TerminalSurface {
    cols: usize,
    rows: usize,
    size: f32,
    cells: Vec<Cell>,
    saved: Vec<Cell>,
    stack: Vec<(Transform, f32)>,
    transform: Transform,
    alpha: f32,
    // What the terminal currently shows.
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl TerminalSurface {
    pub fn new(cols: usize, rows: usize, size: f32) -> Self {
        let blank = vec![Cell::BLANK; cols * rows];
        Self {
            cols,
            rows,
            size,
            cells: blank.clone(),
            saved: blank.clone(),
            stack: Vec::new(),
            transform: Transform::IDENTITY,
            alpha: 1.0,
            last: blank,
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    /// One maze row as it would appear on screen.
    pub fn row_text(&self, row: usize) -> String {
        (0..self.cols)
            .filter_map(|col| self.cell(col, row))
            .map(|cell| padded(cell.glyph.text()))
            .collect()
    }

    /// Forces the next `present` to repaint everything.
    pub fn invalidate(&mut self) {
        self.needs_full = true;
    }

    fn index_at(&self, p: Vec2) -> Option<usize> {
        let col = (p.x / self.size).floor();
        let row = (p.y / self.size).floor();
        if col < 0.0 || row < 0.0 || col as usize >= self.cols || row as usize >= self.rows {
            return None;
        }
        Some(row as usize * self.cols + col as usize)
    }

    fn put(&mut self, at: Vec2, glyph: Glyph, color: Color) {
        let Some(index) = self.index_at(at) else {
            return;
        };
        let color = color.with_alpha(self.alpha);
        if let Some(cell) = self.cells.get_mut(index) {
            if glyph.layer() >= cell.glyph.layer() {
                *cell = Cell { glyph, color };
            }
        }
    }

    fn classify_arc(&self, radius: f32, start: f32, end: f32) -> Option<Glyph> {
        let span = end - start;
        if span <= 0.05 {
            return None;
        }
        if radius <= self.size * 0.1 {
            return Some(Glyph::Dot);
        }
        if span >= TAU - ARC_EPSILON {
            if radius < self.size * 0.25 {
                return Some(Glyph::Power);
            }
            return Some(Glyph::PacmanClosed);
        }
        let unrotated = self.transform.angle().abs() < ARC_EPSILON;
        if unrotated && (start - PI).abs() < ARC_EPSILON && (end - TAU).abs() < ARC_EPSILON {
            return Some(Glyph::Ghost);
        }
        // The gap sits opposite the middle of the filled arc.
        let mouth = ((start + end) / 2.0 - PI).rem_euclid(TAU);
        let quarter = (mouth / (PI / 2.0)).round() as i32 % 4;
        let facing = match quarter {
            1 => Direction::Down,
            2 => Direction::Left,
            3 => Direction::Up,
            _ => Direction::Right,
        };
        Some(Glyph::Pacman(facing))
    }

    /// Repaints changed cells, centered in a terminal of `term` columns x rows.
    pub fn present<W: Write>(&mut self, out: &mut W, hud: &str, term: (u16, u16)) -> io::Result<()> {
        let needed_w = (self.cols * CELL_W) as u16;
        let needed_h = (self.rows + 2) as u16;
        let (term_w, term_h) = term;

        out.queue(MoveTo(0, 0))?;
        if term_w < needed_w || term_h < needed_h {
            out.queue(Clear(ClearType::All))?;
            let msg = format!(
                "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                needed_w, needed_h, term_w, term_h
            );
            out.queue(Print(msg))?;
            out.flush()?;
            self.needs_full = true;
            return Ok(());
        }

        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        if origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
        }
        if self.needs_full {
            out.queue(Clear(ClearType::All))?;
        }

        if self.needs_full || hud != self.last_hud {
            out.queue(MoveTo(self.origin_x, self.origin_y - 1))?;
            out.queue(SetForegroundColor(style::Color::White))?;
            out.queue(Clear(ClearType::CurrentLine))?;
            out.queue(Print(hud))?;
            out.queue(ResetColor)?;
            self.last_hud = hud.to_string();
        }

        for index in 0..self.cells.len() {
            if self.needs_full || self.cells[index] != self.last[index] {
                self.last[index] = self.cells[index].clone();
                self.draw_cell(out, index)?;
            }
        }
        self.needs_full = false;
        out.flush()
    }

    fn draw_cell<W: Write>(&self, out: &mut W, index: usize) -> io::Result<()> {
        let cell = &self.cells[index];
        let x = self.origin_x + ((index % self.cols) * CELL_W) as u16;
        let y = self.origin_y + (index / self.cols) as u16;
        let color = match cell.glyph {
            Glyph::Empty => style::Color::Reset,
            _ => style::Color::Rgb {
                r: cell.color.r,
                g: cell.color.g,
                b: cell.color.b,
            },
        };
        out.queue(MoveTo(x, y))?;
        out.queue(SetForegroundColor(color))?;
        out.queue(Print(padded(cell.glyph.text())))?;
        out.queue(ResetColor)?;
        Ok(())
    }
}

fn padded(text: &str) -> String {
    let w = UnicodeWidthStr::width(text);
    let mut s = text.to_string();
    for _ in w..CELL_W {
        s.push(' ');
    }
    s
}

impl Surface for TerminalSurface {
    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
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
        let at = self.transform.apply(rect.center());
        self.put(at, Glyph::Wall(image.glyph.clone()), image.color);
    }

    fn fill_arc(&mut self, center: Vec2, radius: f32, start: f32, end: f32, color: Color) {
        let turn = self.transform.angle();
        let Some(glyph) = self.classify_arc(radius, start + turn, end + turn) else {
            return;
        };
        let at = self.transform.apply(center);
        self.put(at, glyph, color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let at = self.transform.apply(rect.center());
        let whole = rect.width >= self.size - ARC_EPSILON && rect.height >= self.size - ARC_EPSILON;
        let glyph = if whole { Glyph::Block } else { Glyph::Skirt };
        let covered = self
            .index_at(at)
            .and_then(|i| self.cells.get(i))
            .is_some_and(|c| c.glyph == Glyph::Ghost);
        // A skirt under a dome is already part of the ghost glyph.
        if !covered {
            self.put(at, glyph, color);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        let at = self.transform.apply(rect.center());
        let empty = self
            .index_at(at)
            .and_then(|i| self.cells.get(i))
            .is_some_and(|c| c.glyph == Glyph::Empty);
        if empty {
            self.put(at, Glyph::Grid, color);
        }
    }

    fn fill_text(&mut self, text: &str, at: Vec2, color: Color) {
        let at = self.transform.apply(at);
        let chars: Vec<char> = text.chars().collect();
        let chunks: Vec<String> = chars.chunks(CELL_W).map(|c| c.iter().collect()).collect();
        let first = (at.x / self.size - chunks.len() as f32 / 2.0).round();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let x = (first + i as f32 + 0.5) * self.size;
            self.put(Vec2::new(x, at.y), Glyph::Label(chunk), color);
        }
    }

    fn save_frame(&mut self) {
        self.saved.clone_from(&self.cells);
    }

    fn restore_frame(&mut self) {
        self.cells.clone_from(&self.saved);
    }
}
