//! Text cache
//!
//! Rendered strings packed into a shared atlas and shown on instances.

pub mod rasterizer;
pub mod text_instances;

pub use rasterizer::GlyphRasterizer;
pub use text_instances::TextInstanceList;
