//! Text instance list
//!
//! Binds rendered strings to instances through a packed atlas keyed by the
//! string itself. When the atlas is exhausted the live strings are copied
//! into a fresh atlas of the same size and the failed pack is retried once.

use super::rasterizer::GlyphRasterizer;
use crate::config::TextConfig;
use crate::error::EngineResult;
use crate::gpu::{GraphicsBackend, TextureFilter};
use crate::instance::{self, InstanceHandle, InstanceListData};
use crate::sprites::{self, PackedSheetData, Sprite};

#[derive(Debug)]
pub struct TextInstanceList {
    pub list: InstanceListData,
    config: TextConfig,
    sheet: PackedSheetData,
    repacks: usize,
}

impl TextInstanceList {
    pub fn new(config: TextConfig) -> Self {
        Self {
            list: instance::create_instance_list(),
            sheet: sprites::create_packed_sheet(config.texture_width, config.texture_height),
            config,
            repacks: 0,
        }
    }

    pub fn new_instance(&mut self) -> InstanceHandle {
        instance::new_instance(&mut self.list)
    }

    /// Show `text` on the instance, packing its image if it is not cached
    pub fn set_text<B, R>(
        &mut self,
        backend: &mut B,
        handle: InstanceHandle,
        text: &str,
        rasterizer: &mut R,
    ) -> EngineResult<()>
    where
        B: GraphicsBackend,
        R: GlyphRasterizer + ?Sized,
    {
        // Fail on a stale handle before touching the atlas
        instance::get(&self.list, handle)?;

        let sprite = if sprites::exists(&self.sheet.sheet, text) {
            sprites::sprite(&self.sheet.sheet, text)?
        } else {
            let image = rasterizer.render_text(text);
            match sprites::pack(&mut self.sheet, text, &image) {
                Ok(sprite) => sprite,
                Err(e) if e.is_atlas_exhausted() => {
                    log::debug!("[TextInstanceList::set_text] {}, repacking", e);
                    self.repack(backend)?;
                    sprites::pack(&mut self.sheet, text, &image)?
                }
                Err(e) => return Err(e),
            }
        };

        self.apply_sprite(handle, text, sprite)?;
        self.generate_texture(backend)
    }

    fn apply_sprite(&mut self, handle: InstanceHandle, text: &str, sprite: Sprite) -> EngineResult<()> {
        let item = instance::get_mut(&mut self.list, handle)?;
        item.frame = sprite.index() as u32;
        instance::set_scale(
            item,
            sprite.world_dimensions(self.config.pixels_per_unit).extend(1.0),
        );
        instance::mark_changed(item);
        item.key = Some(text.to_string());
        Ok(())
    }

    fn generate_texture<B: GraphicsBackend>(&mut self, backend: &mut B) -> EngineResult<()> {
        sprites::generate_texture(&mut self.sheet, backend, TextureFilter::Linear)
    }

    /// Copy every live string into a new atlas and remap frames.
    /// Nothing changes if a copy fails.
    fn repack<B: GraphicsBackend>(&mut self, backend: &mut B) -> EngineResult<()> {
        log::info!(
            "[TextInstanceList::repack] Repacking {}x{} atlas ({} sprites, {} instances)",
            self.sheet.width,
            self.sheet.height,
            self.sheet.sheet.count,
            instance::len(&self.list)
        );
        let mut fresh = sprites::create_packed_sheet(self.sheet.width, self.sheet.height);
        let mut frames = Vec::with_capacity(instance::len(&self.list));
        for (handle, item) in instance::iter(&self.list) {
            let Some(key) = item.key.as_deref() else {
                continue;
            };
            let sprite = sprites::copy_sprite(&mut fresh, key, &self.sheet)?;
            frames.push((handle, sprite.index() as u32));
        }

        for (handle, frame) in frames {
            let item = instance::get_mut(&mut self.list, handle)?;
            item.frame = frame;
            instance::mark_changed(item);
        }
        let mut old = std::mem::replace(&mut self.sheet, fresh);
        sprites::delete_packed_sheet(&mut old, backend);
        self.repacks += 1;
        self.generate_texture(backend)?;

        log::info!(
            "[TextInstanceList::repack] Done, {} sprites, {:.1}% used",
            self.sheet.sheet.count,
            sprites::utilization(&self.sheet) * 100.0
        );
        Ok(())
    }

    pub fn bind<B: GraphicsBackend>(&mut self, backend: &mut B) -> EngineResult<()> {
        sprites::bind(&mut self.sheet.sheet, backend)
    }

    pub fn unbind<B: GraphicsBackend>(&self, backend: &mut B) {
        sprites::unbind(&self.sheet.sheet, backend);
    }

    /// Release the atlas texture and lookup table
    pub fn delete<B: GraphicsBackend>(&mut self, backend: &mut B) {
        sprites::delete_packed_sheet(&mut self.sheet, backend);
    }

    pub fn sheet(&self) -> &PackedSheetData {
        &self.sheet
    }

    pub fn sheet_mut(&mut self) -> &mut PackedSheetData {
        &mut self.sheet
    }

    /// Split borrow for the renderer, which needs both at once
    pub fn parts_mut(&mut self) -> (&mut sprites::SheetData, &mut InstanceListData) {
        (&mut self.sheet.sheet, &mut self.list)
    }

    /// Number of repacks performed so far
    pub fn repacks(&self) -> usize {
        self.repacks
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::gpu::HeadlessBackend;
    use glam::Vec3;
    use image::{Rgba, RgbaImage};

    /// 8 px per character, 16 px tall, filled with the first byte
    fn block_rasterizer(text: &str) -> RgbaImage {
        let fill = text.bytes().next().unwrap_or(0);
        RgbaImage::from_pixel(8 * text.len() as u32, 16, Rgba([fill, 0, 0, 255]))
    }

    fn config(width: u32, height: u32) -> TextConfig {
        TextConfig {
            texture_width: width,
            texture_height: height,
            pixels_per_unit: 16.0,
        }
    }

    #[test]
    fn test_set_text() {
        let mut backend = HeadlessBackend::new();
        let mut text = TextInstanceList::new(config(128, 128));
        let handle = text.new_instance();
        text.set_text(&mut backend, handle, "score", &mut block_rasterizer).unwrap();

        let item = instance::get(&text.list, handle).unwrap();
        assert_eq!(item.frame, 0);
        assert_eq!(item.key.as_deref(), Some("score"));
        assert_eq!(item.scale, Vec3::new(2.5, 1.0, 1.0));

        let texture = text.sheet().sheet.texture.unwrap();
        assert_eq!(backend.texture(texture.id).unwrap().filter, TextureFilter::Linear);
        assert_eq!(backend.live_textures(), 1);
    }

    #[test]
    fn test_same_text_is_not_packed_twice() {
        let mut backend = HeadlessBackend::new();
        let mut text = TextInstanceList::new(config(128, 128));
        let a = text.new_instance();
        let b = text.new_instance();
        let mut calls = 0;
        let mut counting = |s: &str| {
            calls += 1;
            block_rasterizer(s)
        };
        text.set_text(&mut backend, a, "hi", &mut counting).unwrap();
        text.set_text(&mut backend, b, "hi", &mut counting).unwrap();
        assert_eq!(calls, 1);
        assert_eq!(text.sheet().sheet.count, 1);
    }

    #[test]
    fn test_repack_reclaims_space() {
        let mut backend = HeadlessBackend::new();
        // One 16 px shelf of 64 px
        let mut text = TextInstanceList::new(config(64, 16));
        let keep = text.new_instance();
        let drop = text.new_instance();
        let fresh = text.new_instance();
        text.set_text(&mut backend, keep, "kkkk", &mut block_rasterizer).unwrap();
        text.set_text(&mut backend, drop, "dddd", &mut block_rasterizer).unwrap();
        instance::remove(&mut text.list, drop).unwrap();

        text.set_text(&mut backend, fresh, "ff", &mut block_rasterizer).unwrap();
        assert_eq!(text.repacks(), 1);

        let sheet = &text.sheet().sheet;
        assert!(!sprites::exists(sheet, "dddd"));
        let kept = sprites::sprite(sheet, "kkkk").unwrap();
        let added = sprites::sprite(sheet, "ff").unwrap();
        assert_eq!(instance::get(&text.list, keep).unwrap().frame, kept.index() as u32);
        assert_eq!(instance::get(&text.list, fresh).unwrap().frame, added.index() as u32);
        assert_eq!(text.sheet().pixels.get_pixel(kept.offset().x as u32, 0).0[0], b'k');
        assert_eq!(backend.live_textures(), 1);
    }

    #[test]
    fn test_repack_does_not_loop() {
        let mut backend = HeadlessBackend::new();
        let mut text = TextInstanceList::new(config(64, 16));
        let a = text.new_instance();
        let b = text.new_instance();
        text.set_text(&mut backend, a, "aaaa", &mut block_rasterizer).unwrap();
        text.set_text(&mut backend, b, "bbbb", &mut block_rasterizer).unwrap();
        let c = text.new_instance();

        let err = text.set_text(&mut backend, c, "cc", &mut block_rasterizer).unwrap_err();
        assert!(matches!(err, EngineError::AtlasFull { .. }));
        assert!(err.is_atlas_exhausted());
        assert_eq!(text.repacks(), 1);
        assert!(instance::get(&text.list, c).unwrap().key.is_none());
        let sheet = &text.sheet().sheet;
        assert_eq!(
            instance::get(&text.list, a).unwrap().frame,
            sprites::sprite(sheet, "aaaa").unwrap().index() as u32
        );
        assert!(sheet.texture.is_some());
    }

    #[test]
    fn test_slot_exhaustion_triggers_repack() {
        let mut backend = HeadlessBackend::new();
        let mut text = TextInstanceList::new(config(64, 64));
        let handle = text.new_instance();
        let mut dot = |_: &str| RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        for i in 0..=sprites::MAX_SPRITES {
            text.set_text(&mut backend, handle, &i.to_string(), &mut dot).unwrap();
        }
        assert_eq!(text.repacks(), 1);
        assert_eq!(text.sheet().sheet.count, 2);
        assert_eq!(instance::get(&text.list, handle).unwrap().frame, 1);
    }

    #[test]
    fn test_stale_handle() {
        let mut backend = HeadlessBackend::new();
        let mut text = TextInstanceList::new(config(64, 64));
        let handle = text.new_instance();
        instance::remove(&mut text.list, handle).unwrap();
        assert!(matches!(
            text.set_text(&mut backend, handle, "x", &mut block_rasterizer),
            Err(EngineError::StaleHandle { .. })
        ));
        assert_eq!(text.sheet().sheet.count, 0);
    }

    #[test]
    fn test_bind_and_delete() {
        let mut backend = HeadlessBackend::new();
        let mut text = TextInstanceList::new(config(64, 64));
        let handle = text.new_instance();
        text.set_text(&mut backend, handle, "x", &mut block_rasterizer).unwrap();
        text.bind(&mut backend).unwrap();
        assert!(backend.bound_texture().is_some());
        text.unbind(&mut backend);
        assert!(backend.bound_texture().is_none());
        text.delete(&mut backend);
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.live_buffers(), 0);
    }
}
