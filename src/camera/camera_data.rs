//! Camera data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in camera_operations.rs

use glam::{Mat4, Vec2, Vec3};

/// Orthographic 2D camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    /// Center of the visible world box
    pub world_center: Vec3,

    /// Extent of the visible world box
    pub world_size: Vec3,

    /// Framebuffer size in pixels
    pub screen_size: Vec2,

    /// Screen pixels per world unit on each axis
    pub px_per_unit: Vec2,

    pub projection: Mat4,
    pub view: Mat4,

    /// Inverse of `projection`, cached for unprojection
    pub inverse: Mat4,
}

/// Camera uniform buffer data for GPU
/// Must match shader layout exactly
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// View matrix (4x4, column-major)
    pub view_matrix: [[f32; 4]; 4],

    /// Projection matrix (4x4, column-major)
    pub projection_matrix: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            projection_matrix: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}
