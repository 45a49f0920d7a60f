//! Batch renderer
//!
//! Streams instance records to the GPU in fixed-size chunks and issues one
//! instanced draw per chunk.

pub mod geometry;
pub mod renderer_data;
pub mod renderer_operations;
pub mod vertex;

pub use geometry::{Geometry, SQUARE};
pub use renderer_data::{BatchRendererData, RenderStats};
pub use renderer_operations::{
    create_batch_renderer, create_batch_renderer_from_config, delete, render,
};
pub use vertex::{Point, RenderInstance};
