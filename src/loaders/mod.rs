//! Asset loaders

pub mod text_mapping;
pub mod texture_packer;

pub use text_mapping::{layout_grid, TextMapping};
pub use texture_packer::{
    build_manifest, load_sheet, parse_manifest, write_manifest, TexturePackerManifest,
};
