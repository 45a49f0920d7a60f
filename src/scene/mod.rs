//! Scene lifecycle and shared resources

pub mod resources;
pub mod scene_load;
pub mod scene_manager;

pub use resources::{Resource, ResourceKey, Resources};
pub use scene_load::{LoadState, SceneLoad};
pub use scene_manager::{BoxedScene, Scene, SceneContext, SceneId, SceneManager, SendScene};
