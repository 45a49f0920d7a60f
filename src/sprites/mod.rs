//! Sprite sheets and the shelf packer
//!
//! A sheet maps keys to rectangles of one texture and owns the GPU lookup
//! table the shader indexes by frame. A packed sheet also owns the atlas
//! pixels and places new images with the shelf allocator.

pub mod packed_sheet_data;
pub mod packed_sheet_operations;
pub mod sheet_data;
pub mod sheet_operations;
pub mod shelf;
pub mod sprite;
pub mod sprite_instances;

pub use packed_sheet_data::PackedSheetData;
pub use packed_sheet_operations::{
    copy_sprite, create_packed_sheet, delete as delete_packed_sheet, generate_texture, pack,
    save_debug, utilization,
};
pub use sheet_data::SheetData;
pub use sheet_operations::{
    add_sprite, bind, build_sprite_table, create_sheet, delete as delete_sheet, exists,
    set_texture, sprite, unbind, upload,
};
pub use shelf::PackingShelf;
pub use sprite::{PackedRect, Sprite, UniformSprite, MAX_SPRITES};
pub use sprite_instances::SpriteInstanceList;
