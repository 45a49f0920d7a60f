//! Packed Sheet Data - Pure DOP
//!
//! A sheet that owns its pixels and places new images itself.

use super::sheet_data::SheetData;
use super::shelf::PackingShelf;
use image::RgbaImage;

/// Sheet plus the CPU-side atlas image and its shelves
///
/// Shelves are ordered top to bottom; only the last one may be open.
/// Placed rectangles never overlap and never leave `width` x `height`.
#[derive(Debug)]
pub struct PackedSheetData {
    pub sheet: SheetData,
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
    pub shelves: Vec<PackingShelf>,
}
