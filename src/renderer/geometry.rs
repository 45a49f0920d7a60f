//! Geometry: the vertices every instance of a batch draws

use super::vertex::Point;
use crate::error::EngineResult;
use crate::gpu::{BufferId, BufferKind, GraphicsBackend};

/// Unit square centred on the origin, two triangles
pub const SQUARE: [Point; 6] = [
    Point::new([-0.5, -0.5, 0.0], [0.0, 0.0], 0.0),
    Point::new([0.5, 0.5, 0.0], [1.0, 1.0], 0.0),
    Point::new([-0.5, 0.5, 0.0], [0.0, 1.0], 0.0),
    Point::new([-0.5, -0.5, 0.0], [0.0, 0.0], 0.0),
    Point::new([0.5, -0.5, 0.0], [1.0, 0.0], 0.0),
    Point::new([0.5, 0.5, 0.0], [1.0, 1.0], 0.0),
];

/// Vertex list plus its GPU buffer. Set `dirty` after editing `points`.
#[derive(Debug, Default)]
pub struct Geometry {
    pub points: Vec<Point>,
    pub dirty: bool,
    buffer: Option<BufferId>,
}

impl Geometry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            dirty: true,
            buffer: None,
        }
    }

    pub fn from_points(points: &[Point]) -> Self {
        Self {
            points: points.to_vec(),
            dirty: true,
            buffer: None,
        }
    }

    pub fn square() -> Self {
        Self::from_points(&SQUARE)
    }

    pub fn vertex_count(&self) -> u32 {
        self.points.len() as u32
    }

    pub fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }

    /// Upload the points if they changed and return the vertex buffer
    pub fn upload<B: GraphicsBackend>(&mut self, backend: &mut B) -> EngineResult<BufferId> {
        let buffer = match self.buffer {
            Some(buffer) => buffer,
            None => {
                let buffer = backend.create_buffer(BufferKind::Vertex)?;
                self.buffer = Some(buffer);
                self.dirty = true;
                buffer
            }
        };
        if self.dirty {
            backend.upload_buffer(buffer, bytemuck::cast_slice(&self.points))?;
            self.dirty = false;
        }
        Ok(buffer)
    }

    pub fn delete<B: GraphicsBackend>(&mut self, backend: &mut B) {
        if let Some(buffer) = self.buffer.take() {
            backend.delete_buffer(buffer);
        }
        self.dirty = true;
    }
}
