//! Headless backend
//!
//! Implements [`GraphicsBackend`] without a device. Every call is recorded,
//! which makes it the backend of choice for tools and tests that need to
//! observe uploads and draw calls.

use super::backend::{
    pow2_extent, BufferId, BufferKind, DrawCall, GraphicsBackend, Texture, TextureFilter,
    TextureId,
};
use super::buffer_manager::{plan_upload, UploadPlan};
use super::thread_affinity::GpuThread;
use crate::camera::CameraUniform;
use crate::error::{EngineError, EngineResult};
use glam::Vec2;
use image::RgbaImage;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct HeadlessBuffer {
    pub kind: BufferKind,
    pub capacity: u64,
    pub data: Vec<u8>,
    pub uploads: usize,
    pub grows: usize,
}

#[derive(Debug, Clone)]
pub struct HeadlessTexture {
    pub texture: Texture,
    pub filter: TextureFilter,
    pub image: RgbaImage,
}

pub struct HeadlessBackend {
    next_id: u32,
    textures: FxHashMap<TextureId, HeadlessTexture>,
    buffers: FxHashMap<BufferId, HeadlessBuffer>,
    bound_texture: Option<TextureId>,
    sprite_table: Option<BufferId>,
    camera: Option<CameraUniform>,
    draw_calls: Vec<DrawCall>,
    textures_created: usize,
    thread: GpuThread,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            textures: FxHashMap::default(),
            buffers: FxHashMap::default(),
            bound_texture: None,
            sprite_table: None,
            camera: None,
            draw_calls: Vec::new(),
            textures_created: 0,
            thread: GpuThread::current(),
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn clear_draw_calls(&mut self) {
        self.draw_calls.clear();
    }

    pub fn buffer(&self, id: BufferId) -> Option<&HeadlessBuffer> {
        self.buffers.get(&id)
    }

    /// Number of uploads that reached the buffer (skipped empty uploads
    /// are not counted)
    pub fn upload_count(&self, id: BufferId) -> usize {
        self.buffers.get(&id).map_or(0, |b| b.uploads)
    }

    pub fn texture(&self, id: TextureId) -> Option<&HeadlessTexture> {
        self.textures.get(&id)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    pub fn bound_texture(&self) -> Option<TextureId> {
        self.bound_texture
    }

    pub fn sprite_table(&self) -> Option<BufferId> {
        self.sprite_table
    }

    pub fn camera(&self) -> Option<&CameraUniform> {
        self.camera.as_ref()
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_texture(
        &mut self,
        image: &RgbaImage,
        filter: TextureFilter,
    ) -> EngineResult<Texture> {
        self.thread.assert_current("create_texture");
        let (width, height) = pow2_extent(image.width(), image.height());
        let texture = Texture {
            id: TextureId(self.next_id()),
            size: Vec2::new(width as f32, height as f32),
            original_size: Vec2::new(image.width() as f32, image.height() as f32),
        };
        self.textures.insert(
            texture.id,
            HeadlessTexture {
                texture,
                filter,
                image: image.clone(),
            },
        );
        self.textures_created += 1;
        Ok(texture)
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound_texture = Some(texture);
    }

    fn unbind_texture(&mut self) {
        self.bound_texture = None;
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.thread.assert_current("delete_texture");
        if self.textures.remove(&texture).is_none() {
            log::warn!("[HeadlessBackend::delete_texture] Unknown texture {:?}", texture);
        }
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
    }

    fn create_buffer(&mut self, kind: BufferKind) -> EngineResult<BufferId> {
        self.thread.assert_current("create_buffer");
        let id = BufferId(self.next_id());
        self.buffers.insert(
            id,
            HeadlessBuffer {
                kind,
                capacity: 0,
                data: Vec::new(),
                uploads: 0,
                grows: 0,
            },
        );
        Ok(id)
    }

    fn upload_buffer(&mut self, buffer: BufferId, bytes: &[u8]) -> EngineResult<()> {
        self.thread.assert_current("upload_buffer");
        let slot = self
            .buffers
            .get_mut(&buffer)
            .ok_or_else(|| EngineError::graphics("upload_buffer", format!("{:?}", buffer)))?;
        match plan_upload(slot.capacity, bytes.len()) {
            UploadPlan::Skip => return Ok(()),
            UploadPlan::Grow(size) => {
                slot.capacity = size;
                slot.grows += 1;
            }
            UploadPlan::Overwrite => {}
        }
        slot.data.clear();
        slot.data.extend_from_slice(bytes);
        slot.uploads += 1;
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.thread.assert_current("delete_buffer");
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("[HeadlessBackend::delete_buffer] Unknown buffer {:?}", buffer);
        }
    }

    fn set_camera(&mut self, camera: &CameraUniform) {
        self.camera = Some(*camera);
    }

    fn bind_sprite_table(&mut self, buffer: BufferId) {
        self.sprite_table = Some(buffer);
    }

    fn draw_instanced(&mut self, call: DrawCall) -> EngineResult<()> {
        self.thread.assert_current("draw_instanced");
        for id in [call.geometry, call.instances] {
            if !self.buffers.contains_key(&id) {
                return Err(EngineError::graphics(
                    "draw_instanced",
                    format!("unknown buffer {:?}", id),
                ));
            }
        }
        self.draw_calls.push(call);
        Ok(())
    }
}
