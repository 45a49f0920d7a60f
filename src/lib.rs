// jam-kit - Data-Oriented Programming (DOP) sprite toolkit
//
// Data lives in plain structs (*_data.rs), transformations in free functions
// (*_operations.rs). GPU work goes through the `gpu::GraphicsBackend` seam so
// everything above it runs the same against wgpu or the headless recorder.
//
// - sprites: shelf packer, sheets and their GPU lookup tables
// - instance: arena-backed instance list with generational handles
// - renderer: batched instanced drawing
// - text: rendered-string cache with repack on exhaustion
// - loaders: TexturePacker manifests and character grids
// - scene: scene lifecycle and shared resources

// Core modules
pub mod config;
pub mod error;

// Essential systems
pub mod camera;
pub mod gpu;
pub mod instance;
pub mod renderer;
pub mod sprites;
pub mod text;

// Assets and lifecycle
pub mod loaders;
pub mod scene;

pub use camera::{CameraData, CameraUniform};
pub use config::{load_config, parse_config, RendererConfig, SpriteConfig, TextConfig, ToolkitConfig};
pub use error::{EngineError, EngineResult, ErrorContext, OptionExt};
pub use gpu::{GraphicsBackend, HeadlessBackend, Texture, TextureFilter, WgpuBackend};
pub use instance::{Instance, InstanceHandle, InstanceListData};
pub use renderer::{BatchRendererData, Geometry, Point, RenderStats};
pub use scene::{Resources, Scene, SceneId, SceneManager};
pub use sprites::{PackedSheetData, SheetData, Sprite, SpriteInstanceList};
pub use text::{GlyphRasterizer, TextInstanceList};
