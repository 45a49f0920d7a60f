//! Sprites: rectangles inside a sheet's texture

use glam::Vec2;

/// Lookup slots available to one sheet. Mirrors `MAX_SPRITES` in
/// `renderer/shaders/sprite.wgsl`.
pub const MAX_SPRITES: usize = 1024;

/// Pixel rectangle inside an atlas image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PackedRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &PackedRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// One entry of the GPU sprite table:
/// `(width_frac, height_frac, u_offset, v_offset)`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformSprite {
    pub texture: [f32; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<UniformSprite>(), 16);

/// Immutable once created; owned by exactly one sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    index: usize,
    bounds: Vec2,
    offset: Vec2,
}

impl Sprite {
    pub(crate) fn new(index: usize, bounds: Vec2, offset: Vec2) -> Self {
        Self {
            index,
            bounds,
            offset,
        }
    }

    /// Slot in the sheet's lookup table
    pub fn index(&self) -> usize {
        self.index
    }

    /// Width and height in pixels
    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Top-left corner in atlas pixels
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn image_bounds(&self) -> PackedRect {
        PackedRect {
            x: self.offset.x as u32,
            y: self.offset.y as u32,
            width: self.bounds.x as u32,
            height: self.bounds.y as u32,
        }
    }

    /// Normalized table entry for a texture of `texture_size` pixels.
    /// V is flipped for bottom-left-origin UV space.
    pub fn texture_bounds(&self, texture_size: Vec2) -> UniformSprite {
        UniformSprite {
            texture: [
                self.bounds.x / texture_size.x,
                self.bounds.y / texture_size.y,
                self.offset.x / texture_size.x,
                1.0 - (self.offset.y + self.bounds.y - 1.0) / texture_size.y,
            ],
        }
    }

    pub fn world_dimensions(&self, px_per_unit: f32) -> Vec2 {
        self.bounds / px_per_unit
    }
}
