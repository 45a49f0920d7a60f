//! Glyph rasterizer seam
//!
//! Font loading and glyph rendering live outside the crate; the text cache
//! only needs an image for a string.

use image::RgbaImage;

pub trait GlyphRasterizer {
    /// Render `text` into an image sized to the glyph run
    fn render_text(&mut self, text: &str) -> RgbaImage;
}

impl<F> GlyphRasterizer for F
where
    F: FnMut(&str) -> RgbaImage,
{
    fn render_text(&mut self, text: &str) -> RgbaImage {
        self(text)
    }
}
