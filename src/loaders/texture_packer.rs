//! TexturePacker manifests
//!
//! Reads and writes the JSON-array export format: a `frames` list of named
//! pixel rectangles plus a `meta` block naming the atlas image.

use crate::error::{EngineError, EngineResult};
use crate::gpu::{GraphicsBackend, TextureFilter};
use crate::sprites::{self, PackedSheetData, SheetData};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatCoords {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntCoords {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
}

impl IntCoords {
    pub fn rect(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            w: Some(w),
            h: Some(h),
        }
    }

    pub fn size(w: i32, h: i32) -> Self {
        Self {
            w: Some(w),
            h: Some(h),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameEntry {
    pub filename: String,
    pub frame: IntCoords,
    pub rotated: bool,
    pub trimmed: bool,
    pub sprite_source_size: IntCoords,
    pub source_size: IntCoords,
    pub pivot: FloatCoords,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestMeta {
    pub image: String,
    pub format: String,
    pub size: IntCoords,
    pub scale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TexturePackerManifest {
    pub frames: Vec<FrameEntry>,
    pub meta: ManifestMeta,
}

pub fn parse_manifest(source: &str) -> EngineResult<TexturePackerManifest> {
    Ok(serde_json::from_str(source)?)
}

/// Load a manifest and its image into a new sheet.
///
/// Frames are added in manifest order, so sprite indices follow it. The
/// image path in `meta.image` is relative to the manifest's directory.
pub fn load_sheet<B: GraphicsBackend>(
    backend: &mut B,
    json_path: impl AsRef<Path>,
    filter: TextureFilter,
) -> EngineResult<SheetData> {
    let json_path = json_path.as_ref();
    let manifest_error = |error: String| EngineError::Manifest {
        path: json_path.display().to_string(),
        error,
    };
    let source = std::fs::read_to_string(json_path)?;
    let manifest = parse_manifest(&source).map_err(|e| manifest_error(e.to_string()))?;
    if manifest.meta.image.is_empty() {
        return Err(manifest_error("meta.image is empty".to_string()));
    }

    let mut sheet = sprites::create_sheet();
    for entry in &manifest.frames {
        let frame = entry.frame;
        sprites::add_sprite(
            &mut sheet,
            &entry.filename,
            Vec2::new(frame.w.unwrap_or(0) as f32, frame.h.unwrap_or(0) as f32),
            Vec2::new(frame.x.unwrap_or(0) as f32, frame.y.unwrap_or(0) as f32),
        )?;
    }

    let dir = json_path.parent().unwrap_or_else(|| Path::new(""));
    let image = image::open(dir.join(&manifest.meta.image))?.to_rgba8();
    let texture = backend.create_texture(&image, filter)?;
    sprites::set_texture(&mut sheet, backend, texture);
    log::info!(
        "[texture_packer::load_sheet] Loaded {} frames from {}",
        sheet.count,
        json_path.display()
    );
    Ok(sheet)
}

/// Describe a packed sheet as a manifest, frames in sprite index order
pub fn build_manifest(packed: &PackedSheetData, image_name: &str) -> TexturePackerManifest {
    let mut entries: Vec<(&String, sprites::Sprite)> =
        packed.sheet.keys.iter().map(|(k, s)| (k, *s)).collect();
    entries.sort_by_key(|(_, sprite)| sprite.index());

    let frames = entries
        .into_iter()
        .map(|(key, sprite)| {
            let rect = sprite.image_bounds();
            let (w, h) = (rect.width as i32, rect.height as i32);
            FrameEntry {
                filename: key.clone(),
                frame: IntCoords::rect(rect.x as i32, rect.y as i32, w, h),
                rotated: false,
                trimmed: false,
                sprite_source_size: IntCoords::rect(0, 0, w, h),
                source_size: IntCoords::size(w, h),
                pivot: FloatCoords { x: 0.5, y: 0.5 },
            }
        })
        .collect();

    TexturePackerManifest {
        frames,
        meta: ManifestMeta {
            image: image_name.to_string(),
            format: "RGBA8888".to_string(),
            size: IntCoords::size(packed.width as i32, packed.height as i32),
            scale: "1".to_string(),
        },
    }
}

/// Serialize a packed sheet to manifest JSON
pub fn write_manifest(packed: &PackedSheetData, image_name: &str) -> EngineResult<String> {
    Ok(serde_json::to_string_pretty(&build_manifest(packed, image_name))?)
}
