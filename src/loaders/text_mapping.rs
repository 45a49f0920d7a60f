//! Character grids drawn from a sprite sheet
//!
//! A [`TextMapping`] assigns sheet frames to characters; [`layout_grid`]
//! turns a block of text into one geometry with a quad per character and
//! the frame baked into each vertex.

use crate::error::{EngineError, EngineResult};
use crate::renderer::{Geometry, Point};
use crate::sprites::{self, SheetData};
use rustc_hash::FxHashMap;

/// Character to frame index, with a fallback for unmapped characters
#[derive(Debug, Clone)]
pub struct TextMapping {
    default_frame: u32,
    mapping: FxHashMap<char, u32>,
}

impl TextMapping {
    pub fn new(sheet: &SheetData, default_key: &str) -> EngineResult<Self> {
        let sprite = sprites::sprite(sheet, default_key)?;
        Ok(Self {
            default_frame: sprite.index() as u32,
            mapping: FxHashMap::default(),
        })
    }

    pub fn set(&mut self, sheet: &SheetData, c: char, key: &str) -> EngineResult<()> {
        let sprite = sprites::sprite(sheet, key)?;
        self.mapping.insert(c, sprite.index() as u32);
        Ok(())
    }

    pub fn get(&self, c: char) -> u32 {
        self.mapping.get(&c).copied().unwrap_or(self.default_frame)
    }
}

fn push_quad(points: &mut Vec<Point>, x: f32, y: f32, frame: u32, scale: f32) {
    let (x, y, unit, frame) = (x * scale, y * scale, scale, frame as f32);
    points.extend_from_slice(&[
        Point::new([x, y, 0.0], [0.0, 0.0], frame),
        Point::new([x + unit, y + unit, 0.0], [1.0, 1.0], frame),
        Point::new([x, y + unit, 0.0], [0.0, 1.0], frame),
        Point::new([x, y, 0.0], [0.0, 0.0], frame),
        Point::new([x + unit, y, 0.0], [1.0, 0.0], frame),
        Point::new([x + unit, y + unit, 0.0], [1.0, 1.0], frame),
    ]);
}

/// Build geometry for `grid`, one `scale`-sized cell per character.
///
/// Column is the character position in its line, row is the line number.
/// Surrounding whitespace is trimmed first.
pub fn layout_grid(mapping: &TextMapping, scale: f32, grid: &str) -> EngineResult<Geometry> {
    let grid = grid.trim();
    if grid.is_empty() {
        return Err(EngineError::config("grid", "no lines in input data"));
    }
    let lines: Vec<&str> = grid.lines().collect();
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut geometry = Geometry::with_capacity(lines.len() * width * 6);
    for (y, line) in lines.iter().enumerate() {
        for (x, c) in line.chars().enumerate() {
            push_quad(&mut geometry.points, x as f32, y as f32, mapping.get(c), scale);
        }
    }
    Ok(geometry)
}
