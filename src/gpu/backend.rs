//! Graphics backend seam
//!
//! Sheets, geometry and the batch renderer talk to the GPU only through
//! [`GraphicsBackend`]. Resources are addressed by small integer ids; each id
//! is owned by exactly one wrapper object which deletes it exactly once.

use crate::camera::CameraUniform;
use crate::error::EngineResult;
use glam::Vec2;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Sampling filter for a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

/// A texture owned by the backend
///
/// `size` is the power-of-two extent actually allocated; UV math divides by
/// it. `original_size` is the extent of the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    pub size: Vec2,
    pub original_size: Vec2,
}

/// What a buffer holds, which decides how the backend binds it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Per-vertex geometry (divisor 0)
    Vertex,
    /// Per-instance frame/model/color records (divisor 1)
    Instance,
    /// Dense sprite UV lookup table
    SpriteTable,
}

/// One instanced draw covering `instance_count` records from the last
/// upload into `instances`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub geometry: BufferId,
    pub vertex_count: u32,
    pub instances: BufferId,
    pub instance_count: u32,
}

/// GPU collaborator contract
pub trait GraphicsBackend {
    fn create_texture(&mut self, image: &RgbaImage, filter: TextureFilter)
        -> EngineResult<Texture>;
    fn bind_texture(&mut self, texture: TextureId);
    fn unbind_texture(&mut self);
    fn delete_texture(&mut self, texture: TextureId);

    fn create_buffer(&mut self, kind: BufferKind) -> EngineResult<BufferId>;
    /// Grow the buffer when `bytes` exceeds its capacity, otherwise update
    /// it in place.
    fn upload_buffer(&mut self, buffer: BufferId, bytes: &[u8]) -> EngineResult<()>;
    fn delete_buffer(&mut self, buffer: BufferId);

    fn set_camera(&mut self, camera: &CameraUniform);
    fn bind_sprite_table(&mut self, buffer: BufferId);
    fn draw_instanced(&mut self, call: DrawCall) -> EngineResult<()>;
}

/// Power-of-two extent that holds a `width` x `height` image
pub fn pow2_extent(width: u32, height: u32) -> (u32, u32) {
    (width.max(1).next_power_of_two(), height.max(1).next_power_of_two())
}
