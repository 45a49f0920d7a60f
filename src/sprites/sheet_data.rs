//! Sheet Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in sheet_operations.rs

use super::sprite::Sprite;
use crate::gpu::{BufferId, Texture};
use rustc_hash::FxHashMap;

/// Symbolic keys mapped to rectangles of one texture
///
/// `count` is both the number of sprites and the next index to assign;
/// indices are never reused within one sheet. `version` moves on every
/// added sprite so the lookup table is only re-uploaded when it changed.
#[derive(Debug, Default)]
pub struct SheetData {
    pub keys: FxHashMap<String, Sprite>,
    pub count: usize,
    pub texture: Option<Texture>,
    pub sprite_table: Option<BufferId>,
    pub version: u64,
    /// None until the first upload
    pub uploaded_version: Option<u64>,
}
