//! Renderer Operations - Pure DOP Functions
//!
//! One `render` call binds the camera, sheet and geometry, then walks the
//! instance list head to tail. Records are staged in chunks of
//! `batch_size`; every full chunk is uploaded and drawn with one instanced
//! call, and the final partial chunk is flushed at the end.

use super::geometry::Geometry;
use super::renderer_data::{BatchRendererData, RenderStats};
use super::vertex::RenderInstance;
use crate::camera::{build_camera_uniform, CameraData};
use crate::config::RendererConfig;
use crate::error::{EngineError, EngineResult};
use crate::gpu::{BufferId, BufferKind, DrawCall, GraphicsBackend};
use crate::instance::{self, InstanceListData};
use crate::sprites::{self, SheetData};

pub fn create_batch_renderer(batch_size: usize) -> EngineResult<BatchRendererData> {
    if batch_size == 0 {
        return Err(EngineError::config("renderer.batch_size", "must be at least 1"));
    }
    Ok(BatchRendererData {
        batch_size,
        staging: Vec::with_capacity(batch_size),
        instance_buffer: None,
    })
}

pub fn create_batch_renderer_from_config(config: &RendererConfig) -> EngineResult<BatchRendererData> {
    create_batch_renderer(config.batch_size)
}

fn instance_buffer<B: GraphicsBackend>(
    renderer: &mut BatchRendererData,
    backend: &mut B,
) -> EngineResult<BufferId> {
    match renderer.instance_buffer {
        Some(buffer) => Ok(buffer),
        None => {
            let buffer = backend.create_buffer(BufferKind::Instance)?;
            renderer.instance_buffer = Some(buffer);
            Ok(buffer)
        }
    }
}

/// Draw every instance in `list` with `geometry`, sampling `sheet`
pub fn render<B: GraphicsBackend>(
    renderer: &mut BatchRendererData,
    backend: &mut B,
    camera: &CameraData,
    sheet: &mut SheetData,
    geometry: &mut Geometry,
    list: &mut InstanceListData,
) -> EngineResult<RenderStats> {
    backend.set_camera(&build_camera_uniform(camera));
    let vertices = geometry.upload(backend)?;
    sprites::bind(sheet, backend)?;
    let instances = instance_buffer(renderer, backend)?;

    let mut stats = RenderStats::default();
    renderer.staging.clear();
    let mut cursor = instance::head(list);
    while let Some(handle) = cursor {
        let item = instance::get_mut(list, handle)?;
        let model = instance::model_matrix(item);
        renderer.staging.push(RenderInstance {
            model: model.to_cols_array_2d(),
            frame: item.frame as f32,
            color: item.color.to_array(),
        });
        stats.instances += 1;
        cursor = instance::next(list, handle);

        if renderer.staging.len() >= renderer.batch_size {
            flush(renderer, backend, vertices, geometry.vertex_count(), instances, &mut stats)?;
        }
    }
    flush(renderer, backend, vertices, geometry.vertex_count(), instances, &mut stats)?;

    log::trace!("[BatchRenderer::render] {}", stats);
    Ok(stats)
}

fn flush<B: GraphicsBackend>(
    renderer: &mut BatchRendererData,
    backend: &mut B,
    geometry: BufferId,
    vertex_count: u32,
    instances: BufferId,
    stats: &mut RenderStats,
) -> EngineResult<()> {
    if renderer.staging.is_empty() {
        return Ok(());
    }
    backend.upload_buffer(instances, bytemuck::cast_slice(&renderer.staging))?;
    backend.draw_instanced(DrawCall {
        geometry,
        vertex_count,
        instances,
        instance_count: renderer.staging.len() as u32,
    })?;
    stats.draw_calls += 1;
    renderer.staging.clear();
    Ok(())
}

pub fn delete<B: GraphicsBackend>(renderer: &mut BatchRendererData, backend: &mut B) {
    if let Some(buffer) = renderer.instance_buffer.take() {
        backend.delete_buffer(buffer);
    }
    renderer.staging.clear();
}
