//! Sheet Operations - Pure DOP Functions
//!
//! GPU work goes through the backend passed in; the sheet only owns ids.

use super::sheet_data::SheetData;
use super::sprite::{Sprite, UniformSprite, MAX_SPRITES};
use crate::error::{EngineError, EngineResult};
use crate::gpu::{BufferKind, GraphicsBackend, Texture};
use glam::Vec2;

/// Create an empty sheet with no texture
pub fn create_sheet() -> SheetData {
    SheetData::default()
}

/// Register a sprite under `key` at the next free index
pub fn add_sprite(
    sheet: &mut SheetData,
    key: &str,
    bounds: Vec2,
    offset: Vec2,
) -> EngineResult<Sprite> {
    if sheet.count >= MAX_SPRITES {
        return Err(EngineError::TooManySprites { max: MAX_SPRITES });
    }
    let sprite = Sprite::new(sheet.count, bounds, offset);
    sheet.keys.insert(key.to_string(), sprite);
    sheet.count += 1;
    sheet.version += 1;
    Ok(sprite)
}

pub fn exists(sheet: &SheetData, key: &str) -> bool {
    sheet.keys.contains_key(key)
}

/// Look up a sprite by key
pub fn sprite(sheet: &SheetData, key: &str) -> EngineResult<Sprite> {
    sheet
        .keys
        .get(key)
        .copied()
        .ok_or_else(|| EngineError::UnknownKey {
            key: key.to_string(),
        })
}

/// Replace the sheet's texture, deleting the previous one
pub fn set_texture<B: GraphicsBackend>(sheet: &mut SheetData, backend: &mut B, texture: Texture) {
    delete_texture(sheet, backend);
    sheet.texture = Some(texture);
    // UV fractions depend on the texture size
    sheet.uploaded_version = None;
}

fn delete_texture<B: GraphicsBackend>(sheet: &mut SheetData, backend: &mut B) {
    if let Some(texture) = sheet.texture.take() {
        backend.delete_texture(texture.id);
    }
}

/// Dense lookup table indexed by sprite index
pub fn build_sprite_table(sheet: &SheetData, texture_size: Vec2) -> Vec<UniformSprite> {
    let mut data = vec![UniformSprite::default(); sheet.count];
    for sprite in sheet.keys.values() {
        data[sprite.index()] = sprite.texture_bounds(texture_size);
    }
    data
}

/// Upload the lookup table if the sheet changed since the last upload.
/// Returns whether an upload happened.
pub fn upload<B: GraphicsBackend>(sheet: &mut SheetData, backend: &mut B) -> EngineResult<bool> {
    if sheet.uploaded_version == Some(sheet.version) {
        return Ok(false);
    }
    let texture = sheet.texture.ok_or_else(|| {
        log::warn!("[Sheet::upload] No texture associated with sheet");
        EngineError::MissingTexture {
            context: "upload".to_string(),
        }
    })?;
    let buffer = match sheet.sprite_table {
        Some(buffer) => buffer,
        None => {
            let buffer = backend.create_buffer(BufferKind::SpriteTable)?;
            sheet.sprite_table = Some(buffer);
            buffer
        }
    };
    let data = build_sprite_table(sheet, texture.size);
    backend.upload_buffer(buffer, bytemuck::cast_slice(&data))?;
    sheet.uploaded_version = Some(sheet.version);
    log::trace!(
        "[Sheet::upload] {} sprites at version {}",
        sheet.count,
        sheet.version
    );
    Ok(true)
}

/// Bind texture and lookup table, uploading the table first if stale
pub fn bind<B: GraphicsBackend>(sheet: &mut SheetData, backend: &mut B) -> EngineResult<()> {
    if let Some(texture) = sheet.texture {
        backend.bind_texture(texture.id);
    }
    upload(sheet, backend)?;
    if let Some(buffer) = sheet.sprite_table {
        backend.bind_sprite_table(buffer);
    }
    Ok(())
}

pub fn unbind<B: GraphicsBackend>(sheet: &SheetData, backend: &mut B) {
    if sheet.texture.is_some() {
        backend.unbind_texture();
    }
}

/// Release the texture and lookup table. Safe to call more than once.
pub fn delete<B: GraphicsBackend>(sheet: &mut SheetData, backend: &mut B) {
    delete_texture(sheet, backend);
    if let Some(buffer) = sheet.sprite_table.take() {
        backend.delete_buffer(buffer);
    }
    sheet.uploaded_version = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{HeadlessBackend, TextureFilter};
    use image::RgbaImage;

    fn textured_sheet(backend: &mut HeadlessBackend) -> SheetData {
        let mut sheet = create_sheet();
        let texture = backend
            .create_texture(&RgbaImage::new(64, 64), TextureFilter::Nearest)
            .unwrap();
        set_texture(&mut sheet, backend, texture);
        sheet
    }

    #[test]
    fn test_indices_are_dense() {
        let mut sheet = create_sheet();
        for i in 0..10 {
            let sprite = add_sprite(&mut sheet, &format!("s{}", i), Vec2::ONE, Vec2::ZERO).unwrap();
            assert_eq!(sprite.index(), i);
        }
        assert_eq!(sheet.count, 10);
        let mut indices: Vec<usize> = sheet.keys.values().map(|s| s.index()).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_key() {
        let sheet = create_sheet();
        assert!(matches!(
            sprite(&sheet, "missing"),
            Err(EngineError::UnknownKey { .. })
        ));
        assert!(!exists(&sheet, "missing"));
    }

    #[test]
    fn test_slot_limit() {
        let mut sheet = create_sheet();
        for i in 0..MAX_SPRITES {
            add_sprite(&mut sheet, &i.to_string(), Vec2::ONE, Vec2::ZERO).unwrap();
        }
        assert!(matches!(
            add_sprite(&mut sheet, "one-too-many", Vec2::ONE, Vec2::ZERO),
            Err(EngineError::TooManySprites { .. })
        ));
    }

    #[test]
    fn test_upload_is_idempotent() {
        let mut backend = HeadlessBackend::new();
        let mut sheet = textured_sheet(&mut backend);
        add_sprite(&mut sheet, "a", Vec2::new(8.0, 8.0), Vec2::ZERO).unwrap();

        assert!(upload(&mut sheet, &mut backend).unwrap());
        assert!(!upload(&mut sheet, &mut backend).unwrap());
        let table = sheet.sprite_table.unwrap();
        assert_eq!(backend.upload_count(table), 1);

        add_sprite(&mut sheet, "b", Vec2::new(8.0, 8.0), Vec2::new(8.0, 0.0)).unwrap();
        assert!(upload(&mut sheet, &mut backend).unwrap());
        assert_eq!(backend.upload_count(table), 2);
        assert_eq!(backend.buffer(table).unwrap().data.len(), 32);
    }

    #[test]
    fn test_upload_without_texture_fails() {
        let mut backend = HeadlessBackend::new();
        let mut sheet = create_sheet();
        add_sprite(&mut sheet, "a", Vec2::ONE, Vec2::ZERO).unwrap();
        assert!(matches!(
            upload(&mut sheet, &mut backend),
            Err(EngineError::MissingTexture { .. })
        ));
    }

    #[test]
    fn test_replacing_texture_deletes_old_and_forces_upload() {
        let mut backend = HeadlessBackend::new();
        let mut sheet = textured_sheet(&mut backend);
        add_sprite(&mut sheet, "a", Vec2::ONE, Vec2::ZERO).unwrap();
        upload(&mut sheet, &mut backend).unwrap();

        let texture = backend
            .create_texture(&RgbaImage::new(128, 128), TextureFilter::Nearest)
            .unwrap();
        set_texture(&mut sheet, &mut backend, texture);
        assert_eq!(backend.live_textures(), 1);
        assert!(upload(&mut sheet, &mut backend).unwrap());
    }

    #[test]
    fn test_bind_and_delete() {
        let mut backend = HeadlessBackend::new();
        let mut sheet = textured_sheet(&mut backend);
        add_sprite(&mut sheet, "a", Vec2::ONE, Vec2::ZERO).unwrap();
        bind(&mut sheet, &mut backend).unwrap();
        assert_eq!(backend.bound_texture(), sheet.texture.map(|t| t.id));
        assert_eq!(backend.sprite_table(), sheet.sprite_table);

        delete(&mut sheet, &mut backend);
        delete(&mut sheet, &mut backend);
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.live_buffers(), 0);
    }
}
