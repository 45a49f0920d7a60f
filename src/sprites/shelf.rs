//! Shelf allocator
//!
//! One horizontal strip of an atlas, filled left to right. While open its
//! height grows to the tallest sprite placed on it; once closed the height
//! is frozen and only sprites no taller than it are accepted.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackingShelf {
    pub x: u32,
    pub y: u32,
    pub height: u32,
    pub is_open: bool,
}

impl Default for PackingShelf {
    fn default() -> Self {
        Self::new()
    }
}

impl PackingShelf {
    pub fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            height: 0,
            is_open: true,
        }
    }

    pub fn fits_x(&self, w: u32, max_w: u32) -> bool {
        self.x as u64 + w as u64 <= max_w as u64
    }

    pub fn fits_y(&self, h: u32) -> bool {
        self.height >= h
    }

    /// Whether the shelf still lies inside an atlas `max_h` tall after
    /// taking a sprite `h` tall. Only an open shelf can grow.
    pub fn fits_atlas(&self, h: u32, max_h: u32) -> bool {
        let height = if self.is_open { self.height.max(h) } else { self.height };
        self.y as u64 + height as u64 <= max_h as u64
    }

    pub fn remaining_x(&self, max_w: u32) -> u32 {
        max_w.saturating_sub(self.x)
    }

    pub fn can_add(&self, w: u32, h: u32, max_w: u32) -> bool {
        if !self.fits_x(w, max_w) {
            return false;
        }
        if !self.is_open && !self.fits_y(h) {
            return false;
        }
        true
    }

    /// Remaining shelf area minus the sprite's area. Higher wastes less.
    ///
    /// Vertical waste (`height - h`) is not scored separately from
    /// horizontal waste.
    pub fn best_area_fit(&self, w: u32, h: u32, max_w: u32) -> i64 {
        let shelf_area = self.remaining_x(max_w) as i64 * self.height as i64;
        let sprite_area = w as i64 * h as i64;
        shelf_area - sprite_area
    }

    /// Place a `w` x `h` sprite and return its top-left corner.
    /// Only valid after `can_add` returned true.
    pub fn add(&mut self, w: u32, h: u32) -> (u32, u32) {
        let origin = (self.x, self.y);
        if self.is_open && self.height < h {
            self.height = h;
        }
        self.x += w;
        origin
    }

    /// Freeze this shelf and return a fresh open one directly below it
    pub fn close(&mut self) -> PackingShelf {
        self.is_open = false;
        PackingShelf {
            y: self.y + self.height,
            ..PackingShelf::new()
        }
    }
}
