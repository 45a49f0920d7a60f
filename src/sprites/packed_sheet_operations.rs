//! Packed Sheet Operations - Pure DOP Functions
//!
//! Shelf placement: among the shelves that can take the rectangle, pick the
//! highest best-area-fit score (earliest shelf on ties). When none can, close
//! the last shelf and open a new one below it if there is room.

use super::packed_sheet_data::PackedSheetData;
use super::sheet_data::SheetData;
use super::sheet_operations;
use super::shelf::PackingShelf;
use super::sprite::{Sprite, MAX_SPRITES};
use crate::error::{EngineError, EngineResult};
use crate::gpu::{GraphicsBackend, TextureFilter};
use glam::Vec2;
use image::{imageops, RgbaImage};
use std::path::Path;

/// Create an empty atlas of `width` x `height` pixels
pub fn create_packed_sheet(width: u32, height: u32) -> PackedSheetData {
    PackedSheetData {
        sheet: sheet_operations::create_sheet(),
        width,
        height,
        pixels: RgbaImage::new(width, height),
        shelves: vec![PackingShelf::new()],
    }
}

/// Place `image` under `key` and copy its pixels into the atlas.
///
/// Packing a key that already exists is a no-op returning the existing
/// sprite.
pub fn pack(data: &mut PackedSheetData, key: &str, image: &RgbaImage) -> EngineResult<Sprite> {
    if let Some(sprite) = data.sheet.keys.get(key) {
        return Ok(*sprite);
    }
    let (x, y) = pack_region(data, key, image.width(), image.height())?;
    imageops::replace(&mut data.pixels, image, x as i64, y as i64);
    add_placed(&mut data.sheet, key, x, y, image.width(), image.height())
}

/// Place the pixels `source` holds for `key` into this atlas.
///
/// Used by repack to move a sprite without rasterizing it again.
pub fn copy_sprite(
    data: &mut PackedSheetData,
    key: &str,
    source: &PackedSheetData,
) -> EngineResult<Sprite> {
    if let Some(sprite) = data.sheet.keys.get(key) {
        return Ok(*sprite);
    }
    let rect = sheet_operations::sprite(&source.sheet, key)?.image_bounds();
    let (x, y) = pack_region(data, key, rect.width, rect.height)?;
    let region = imageops::crop_imm(&source.pixels, rect.x, rect.y, rect.width, rect.height).to_image();
    imageops::replace(&mut data.pixels, &region, x as i64, y as i64);
    add_placed(&mut data.sheet, key, x, y, rect.width, rect.height)
}

fn add_placed(
    sheet: &mut SheetData,
    key: &str,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
) -> EngineResult<Sprite> {
    sheet_operations::add_sprite(
        sheet,
        key,
        Vec2::new(w as f32, h as f32),
        Vec2::new(x as f32, y as f32),
    )
}

/// Reserve a `w` x `h` rectangle and return its top-left corner.
/// Nothing is mutated when this fails.
fn pack_region(data: &mut PackedSheetData, key: &str, w: u32, h: u32) -> EngineResult<(u32, u32)> {
    if data.sheet.count >= MAX_SPRITES {
        return Err(EngineError::TooManySprites { max: MAX_SPRITES });
    }
    let full = || EngineError::AtlasFull {
        key: key.to_string(),
        width: w,
        height: h,
    };
    if w > data.width || h > data.height {
        return Err(full());
    }

    let mut best: Option<(usize, i64)> = None;
    for (i, shelf) in data.shelves.iter().enumerate() {
        if !shelf.can_add(w, h, data.width) || !shelf.fits_atlas(h, data.height) {
            continue;
        }
        let score = shelf.best_area_fit(w, h, data.width);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((i, score));
        }
    }

    let index = match best {
        Some((i, _)) => i,
        None => {
            let last = data.shelves.last_mut().ok_or_else(full)?;
            if last.y as u64 + last.height as u64 + h as u64 > data.height as u64 {
                log::debug!(
                    "[PackedSheet::pack] No room for '{}' ({}x{}) below shelf at y={}",
                    key,
                    w,
                    h,
                    last.y
                );
                return Err(full());
            }
            let next = last.close();
            data.shelves.push(next);
            data.shelves.len() - 1
        }
    };

    let (x, y) = data.shelves[index].add(w, h);
    log::trace!(
        "[PackedSheet::pack] '{}' ({}x{}) at ({}, {}) on shelf {}",
        key,
        w,
        h,
        x,
        y,
        index
    );
    Ok((x, y))
}

/// Upload the atlas pixels as the sheet's texture, replacing any previous one
pub fn generate_texture<B: GraphicsBackend>(
    data: &mut PackedSheetData,
    backend: &mut B,
    filter: TextureFilter,
) -> EngineResult<()> {
    let texture = backend.create_texture(&data.pixels, filter)?;
    sheet_operations::set_texture(&mut data.sheet, backend, texture);
    Ok(())
}

/// Fraction of the atlas area covered by sprites
pub fn utilization(data: &PackedSheetData) -> f32 {
    let total = data.width as u64 * data.height as u64;
    if total == 0 {
        return 0.0;
    }
    let used: u64 = data.sheet.keys.values().map(|s| s.image_bounds().area()).sum();
    used as f32 / total as f32
}

/// Write the atlas image to disk
pub fn save_debug(data: &PackedSheetData, path: impl AsRef<Path>) -> EngineResult<()> {
    data.pixels.save(path)?;
    Ok(())
}

/// Release the sheet's GPU resources
pub fn delete<B: GraphicsBackend>(data: &mut PackedSheetData, backend: &mut B) {
    sheet_operations::delete(&mut data.sheet, backend);
}
