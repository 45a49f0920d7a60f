//! Vertex formats
//!
//! `Point` is per-vertex geometry, `RenderInstance` is the per-instance
//! record streamed in batches. Shader locations 0-2 belong to the geometry
//! and 3-8 to the instance.

use static_assertions::const_assert_eq;
use std::mem::size_of;

/// One geometry vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Point {
    pub position: [f32; 3],
    pub texture: [f32; 2],
    /// Added to the instance frame to pick the sprite table entry
    pub frame: f32,
}

const_assert_eq!(size_of::<Point>(), 24);

impl Point {
    pub const fn new(position: [f32; 3], texture: [f32; 2], frame: f32) -> Self {
        Self {
            position,
            texture,
            frame,
        }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: 12,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x2,
        },
        wgpu::VertexAttribute {
            offset: 20,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Point>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-instance record: model matrix, frame, color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderInstance {
    pub model: [[f32; 4]; 4],
    pub frame: f32,
    pub color: [f32; 4],
}

const_assert_eq!(size_of::<RenderInstance>(), 84);

impl Default for RenderInstance {
    fn default() -> Self {
        Self {
            model: glam::Mat4::IDENTITY.to_cols_array_2d(),
            frame: 0.0,
            color: [0.0; 4],
        }
    }
}

impl RenderInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = [
        // Model matrix columns
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 16,
            shader_location: 4,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 32,
            shader_location: 5,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 48,
            shader_location: 6,
            format: wgpu::VertexFormat::Float32x4,
        },
        wgpu::VertexAttribute {
            offset: 64,
            shader_location: 7,
            format: wgpu::VertexFormat::Float32,
        },
        wgpu::VertexAttribute {
            offset: 68,
            shader_location: 8,
            format: wgpu::VertexFormat::Float32x4,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<RenderInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_match_struct_sizes() {
        let point = Point::layout();
        assert_eq!(point.array_stride, 24);
        assert_eq!(point.step_mode, wgpu::VertexStepMode::Vertex);

        let instance = RenderInstance::layout();
        assert_eq!(instance.array_stride, 84);
        assert_eq!(instance.step_mode, wgpu::VertexStepMode::Instance);
        let locations: Vec<u32> = instance.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_instance_bytes() {
        let instances = [RenderInstance::default(); 3];
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), 3 * 84);
    }
}
