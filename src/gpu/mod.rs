//! GPU seam: backend trait, resource ids and the two backends

pub mod backend;
pub mod buffer_manager;
pub mod headless;
pub mod thread_affinity;
pub mod wgpu_backend;

pub use backend::{
    pow2_extent, BufferId, BufferKind, DrawCall, GraphicsBackend, Texture, TextureFilter,
    TextureId,
};
pub use buffer_manager::{plan_upload, GpuBuffer, UploadPlan};
pub use headless::HeadlessBackend;
pub use thread_affinity::GpuThread;
pub use wgpu_backend::WgpuBackend;
