//! wgpu implementation of [`GraphicsBackend`]
//!
//! Draw calls are recorded while the renderer walks its instance lists and
//! replayed into a single render pass by [`WgpuBackend::encode_frame`].
//! Instance uploads are appended to a per-frame stream so every recorded
//! draw keeps its own instance range even though the renderer reuses one
//! staging buffer for all of its batches.

use super::backend::{
    pow2_extent, BufferId, BufferKind, DrawCall, GraphicsBackend, Texture, TextureFilter,
    TextureId,
};
use super::buffer_manager::GpuBuffer;
use super::thread_affinity::GpuThread;
use crate::camera::CameraUniform;
use crate::error::{EngineError, EngineResult};
use crate::renderer::vertex::{Point, RenderInstance};
use crate::sprites::{UniformSprite, MAX_SPRITES};
use glam::Vec2;
use image::RgbaImage;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::num::NonZeroU64;
use std::ops::Range;
use std::sync::Arc;
use wgpu::{BindGroup, BindGroupLayout, BufferUsages, Device, Queue, RenderPipeline};

/// Dynamic-offset stride between camera uniforms in one frame
const CAMERA_STRIDE: u64 = 256;
const SPRITE_TABLE_BYTES: u64 = (MAX_SPRITES * std::mem::size_of::<UniformSprite>()) as u64;

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: BindGroup,
}

struct BufferSlot {
    kind: BufferKind,
    gpu: GpuBuffer,
    /// Instance bytes appended this frame
    stream: Vec<u8>,
    /// Byte range of the most recent instance upload inside `stream`
    chunk: Range<u64>,
    bind_group: Option<BindGroup>,
}

struct RecordedDraw {
    geometry: BufferId,
    vertex_count: u32,
    instances: BufferId,
    range: Range<u64>,
    instance_count: u32,
    texture: Option<TextureId>,
    sprite_table: Option<BufferId>,
    camera: u32,
}

pub struct WgpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    thread: GpuThread,
    pipeline: RenderPipeline,
    camera_layout: BindGroupLayout,
    texture_layout: BindGroupLayout,
    table_layout: BindGroupLayout,
    camera_buffer: GpuBuffer,
    camera_bind_group: Option<BindGroup>,
    cameras: Vec<CameraUniform>,
    textures: FxHashMap<TextureId, GpuTexture>,
    buffers: FxHashMap<BufferId, BufferSlot>,
    bound_texture: Option<TextureId>,
    sprite_table: Option<BufferId>,
    commands: Vec<RecordedDraw>,
    next_id: u32,
}

impl WgpuBackend {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>, format: wgpu::TextureFormat) -> Self {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<CameraUniform>() as u64),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Atlas Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let table_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Table Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(SPRITE_TABLE_BYTES),
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "../renderer/shaders/sprite.wgsl"
            ))),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout, &table_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sprite Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Point::layout(), RenderInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let camera_buffer = GpuBuffer::new("Camera Uniforms", BufferUsages::UNIFORM);

        Self {
            device,
            queue,
            thread: GpuThread::current(),
            pipeline,
            camera_layout,
            texture_layout,
            table_layout,
            camera_buffer,
            camera_bind_group: None,
            cameras: Vec::new(),
            textures: FxHashMap::default(),
            buffers: FxHashMap::default(),
            bound_texture: None,
            sprite_table: None,
            commands: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of draws recorded since the last encode
    pub fn pending_draws(&self) -> usize {
        self.commands.len()
    }

    /// Upload this frame's streams and replay every recorded draw into one
    /// render pass targeting `target`. The pass loads existing contents, so
    /// clearing is left to the caller.
    pub fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> EngineResult<()> {
        self.thread.assert_current("encode_frame");
        let commands = std::mem::take(&mut self.commands);
        if commands.is_empty() {
            self.reset_frame();
            return Ok(());
        }

        if self.cameras.is_empty() {
            self.cameras.push(CameraUniform::default());
        }
        let mut camera_bytes = vec![0u8; self.cameras.len() * CAMERA_STRIDE as usize];
        for (i, camera) in self.cameras.iter().enumerate() {
            let start = i * CAMERA_STRIDE as usize;
            let bytes = bytemuck::bytes_of(camera);
            camera_bytes[start..start + bytes.len()].copy_from_slice(bytes);
        }
        let grew = self
            .camera_buffer
            .upload(&self.device, &self.queue, &camera_bytes);
        if grew || self.camera_bind_group.is_none() {
            let buffer = self
                .camera_buffer
                .buffer()
                .ok_or_else(|| EngineError::graphics("encode_frame", "camera buffer missing"))?;
            self.camera_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Camera Bind Group"),
                layout: &self.camera_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer,
                        offset: 0,
                        size: NonZeroU64::new(std::mem::size_of::<CameraUniform>() as u64),
                    }),
                }],
            }));
        }

        for slot in self.buffers.values_mut() {
            if slot.kind == BufferKind::Instance && !slot.stream.is_empty() {
                slot.gpu.upload(&self.device, &self.queue, &slot.stream);
            }
        }

        {
            let camera_bind_group = self
                .camera_bind_group
                .as_ref()
                .ok_or_else(|| EngineError::graphics("encode_frame", "camera bind group missing"))?;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);

            for draw in &commands {
                let texture = draw
                    .texture
                    .and_then(|id| self.textures.get(&id))
                    .ok_or_else(|| EngineError::MissingTexture {
                        context: "encode_frame".to_string(),
                    })?;
                let table = draw
                    .sprite_table
                    .and_then(|id| self.buffers.get(&id))
                    .and_then(|slot| slot.bind_group.as_ref())
                    .ok_or_else(|| EngineError::graphics("encode_frame", "sprite table not bound"))?;
                let geometry = self
                    .buffers
                    .get(&draw.geometry)
                    .and_then(|slot| slot.gpu.buffer())
                    .ok_or_else(|| EngineError::graphics("encode_frame", "geometry not uploaded"))?;
                let instances = self
                    .buffers
                    .get(&draw.instances)
                    .and_then(|slot| slot.gpu.buffer())
                    .ok_or_else(|| EngineError::graphics("encode_frame", "instances not uploaded"))?;

                pass.set_bind_group(0, camera_bind_group, &[draw.camera * CAMERA_STRIDE as u32]);
                pass.set_bind_group(1, &texture.bind_group, &[]);
                pass.set_bind_group(2, table, &[]);
                pass.set_vertex_buffer(0, geometry.slice(..));
                pass.set_vertex_buffer(1, instances.slice(draw.range.clone()));
                pass.draw(0..draw.vertex_count, 0..draw.instance_count);
            }
        }

        self.reset_frame();
        Ok(())
    }

    fn reset_frame(&mut self) {
        self.cameras.clear();
        for slot in self.buffers.values_mut() {
            slot.stream.clear();
            slot.chunk = 0..0;
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_texture(
        &mut self,
        image: &RgbaImage,
        filter: TextureFilter,
    ) -> EngineResult<Texture> {
        self.thread.assert_current("create_texture");
        let (width, height) = pow2_extent(image.width(), image.height());
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        if width > max_dimension || height > max_dimension {
            return Err(EngineError::graphics(
                "create_texture",
                format!("{}x{} exceeds device limit {}", width, height, max_dimension),
            ));
        }

        // Texture rows run bottom-up so the sprite table's flipped V lands
        // on the right pixels.
        let mut padded = RgbaImage::new(width, height);
        image::imageops::replace(&mut padded, image, 0, 0);
        let pixels = image::imageops::flip_vertical(&padded);

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sheet Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter_mode = match filter {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        };
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sheet Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode,
            min_filter: filter_mode,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sheet Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let id = TextureId(self.next_id());
        self.textures.insert(
            id,
            GpuTexture {
                _texture: texture,
                bind_group,
            },
        );
        Ok(Texture {
            id,
            size: Vec2::new(width as f32, height as f32),
            original_size: Vec2::new(image.width() as f32, image.height() as f32),
        })
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
            log::warn!("[WgpuBackend::delete_texture] Unknown texture {:?}", texture);
        }
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
    }

    fn create_buffer(&mut self, kind: BufferKind) -> EngineResult<BufferId> {
        self.thread.assert_current("create_buffer");
        let (gpu, bind_group) = match kind {
            BufferKind::Vertex => (GpuBuffer::new("Geometry", BufferUsages::VERTEX), None),
            BufferKind::Instance => (GpuBuffer::new("Instances", BufferUsages::VERTEX), None),
            BufferKind::SpriteTable => {
                let gpu = GpuBuffer::new("Sprite Table", BufferUsages::UNIFORM)
                    .with_min_capacity(&self.device, SPRITE_TABLE_BYTES);
                let buffer = gpu
                    .buffer()
                    .ok_or_else(|| EngineError::graphics("create_buffer", "sprite table"))?;
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Sprite Table Bind Group"),
                    layout: &self.table_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                (gpu, Some(bind_group))
            }
        };
        let id = BufferId(self.next_id());
        self.buffers.insert(
            id,
            BufferSlot {
                kind,
                gpu,
                stream: Vec::new(),
                chunk: 0..0,
                bind_group,
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
        match slot.kind {
            BufferKind::Instance => {
                let start = slot.stream.len() as u64;
                slot.stream.extend_from_slice(bytes);
                slot.chunk = start..slot.stream.len() as u64;
            }
            BufferKind::SpriteTable => {
                if bytes.len() as u64 > SPRITE_TABLE_BYTES {
                    return Err(EngineError::TooManySprites { max: MAX_SPRITES });
                }
                slot.gpu.upload(&self.device, &self.queue, bytes);
            }
            BufferKind::Vertex => {
                slot.gpu.upload(&self.device, &self.queue, bytes);
            }
        }
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.thread.assert_current("delete_buffer");
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("[WgpuBackend::delete_buffer] Unknown buffer {:?}", buffer);
        }
        if self.sprite_table == Some(buffer) {
            self.sprite_table = None;
        }
    }

    fn set_camera(&mut self, camera: &CameraUniform) {
        self.cameras.push(*camera);
    }

    fn bind_sprite_table(&mut self, buffer: BufferId) {
        self.sprite_table = Some(buffer);
    }

    fn draw_instanced(&mut self, call: DrawCall) -> EngineResult<()> {
        self.thread.assert_current("draw_instanced");
        let range = self
            .buffers
            .get(&call.instances)
            .map(|slot| slot.chunk.clone())
            .ok_or_else(|| EngineError::graphics("draw_instanced", format!("{:?}", call.instances)))?;
        if self.cameras.is_empty() {
            self.cameras.push(CameraUniform::default());
        }
        self.commands.push(RecordedDraw {
            geometry: call.geometry,
            vertex_count: call.vertex_count,
            instances: call.instances,
            range,
            instance_count: call.instance_count,
            texture: self.bound_texture,
            sprite_table: self.sprite_table,
            camera: (self.cameras.len() - 1) as u32,
        });
        Ok(())
    }
}
