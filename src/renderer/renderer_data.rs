//! Renderer Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in renderer_operations.rs

use super::vertex::RenderInstance;
use crate::gpu::BufferId;

/// Instanced batch renderer state
///
/// `staging` never holds more than `batch_size` records; it is flushed and
/// reset as soon as it is full.
#[derive(Debug)]
pub struct BatchRendererData {
    pub batch_size: usize,
    pub staging: Vec<RenderInstance>,
    pub instance_buffer: Option<BufferId>,
}

/// Counters for one `render` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub instances: usize,
    pub draw_calls: usize,
}

impl std::fmt::Display for RenderStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instances in {} draw calls", self.instances, self.draw_calls)
    }
}
