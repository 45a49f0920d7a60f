//! Toolkit configuration
//!
//! Plain data with defaults. A TOML file may override any subset of fields.

use crate::error::{EngineError, EngineResult};
use crate::gpu::TextureFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Text cache atlas configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub texture_width: u32,
    pub texture_height: u32,
    pub pixels_per_unit: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            texture_width: 512,
            texture_height: 512,
            pixels_per_unit: 32.0,
        }
    }
}

/// Batch renderer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Instances staged before a flush issues one instanced draw
    pub batch_size: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Sprite sheet configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    pub pixels_per_unit: f32,
    pub filter: TextureFilter,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            pixels_per_unit: 32.0,
            filter: TextureFilter::Nearest,
        }
    }
}

/// Top level configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub text: TextConfig,
    pub renderer: RendererConfig,
    pub sprites: SpriteConfig,
}

/// Parse and validate a TOML config document
pub fn parse_config(source: &str) -> EngineResult<ToolkitConfig> {
    let config: ToolkitConfig =
        toml::from_str(source).map_err(|e| EngineError::config("toml", e))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> EngineResult<ToolkitConfig> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let config = parse_config(&source)?;
    log::debug!("[config::load_config] Loaded {}", path.display());
    Ok(config)
}

pub fn validate_config(config: &ToolkitConfig) -> EngineResult<()> {
    if config.renderer.batch_size == 0 {
        return Err(EngineError::config("renderer.batch_size", "must be > 0"));
    }
    if config.text.texture_width == 0 || config.text.texture_height == 0 {
        return Err(EngineError::config(
            "text.texture_width/texture_height",
            "atlas dimensions must be non-zero",
        ));
    }
    if !(config.text.pixels_per_unit > 0.0) {
        return Err(EngineError::config("text.pixels_per_unit", "must be > 0"));
    }
    if !(config.sprites.pixels_per_unit > 0.0) {
        return Err(EngineError::config("sprites.pixels_per_unit", "must be > 0"));
    }
    Ok(())
}
