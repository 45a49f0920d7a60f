//! Scene lifecycle
//!
//! Scenes live in an ID-keyed map with a separate newest-first order.
//! Removal requested during a frame is deferred until every scene has
//! updated, then the removed scenes are unloaded.

use super::resources::Resources;
use super::scene_load::{LoadState, SceneLoad};
use crate::error::{EngineError, EngineResult};
use crate::gpu::{GpuThread, GraphicsBackend};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u32);

/// What a scene sees during a lifecycle call
pub struct SceneContext<'a, B: GraphicsBackend> {
    pub backend: &'a mut B,
    pub resources: &'a mut Resources,
    removals: &'a mut Vec<SceneId>,
}

impl<'a, B: GraphicsBackend> SceneContext<'a, B> {
    /// Remove `id` once the current update finishes
    pub fn remove_scene(&mut self, id: SceneId) {
        if !self.removals.contains(&id) {
            self.removals.push(id);
        }
    }
}

pub trait Scene<B: GraphicsBackend> {
    fn load(&mut self, ctx: &mut SceneContext<'_, B>) -> EngineResult<()>;
    fn unload(&mut self, ctx: &mut SceneContext<'_, B>) -> EngineResult<()>;
    fn update(&mut self, id: SceneId, ctx: &mut SceneContext<'_, B>) -> EngineResult<()>;
    fn render(&mut self, ctx: &mut SceneContext<'_, B>) -> EngineResult<()>;
}

pub type BoxedScene<B> = Box<dyn Scene<B>>;
/// Scenes built off-thread must be sendable
pub type SendScene<B> = Box<dyn Scene<B> + Send>;

pub struct SceneManager<B: GraphicsBackend> {
    scenes: FxHashMap<SceneId, BoxedScene<B>>,
    order: Vec<SceneId>,
    removals: Vec<SceneId>,
    pending: Vec<SceneLoad<SendScene<B>>>,
    resources: Resources,
    next_id: u32,
    thread: GpuThread,
}

impl<B: GraphicsBackend> Default for SceneManager<B> {
    fn default() -> Self {
        Self::new(Resources::new())
    }
}

impl<B: GraphicsBackend> SceneManager<B> {
    pub fn new(resources: Resources) -> Self {
        Self {
            scenes: FxHashMap::default(),
            order: Vec::new(),
            removals: Vec::new(),
            pending: Vec::new(),
            resources,
            next_id: 1,
            thread: GpuThread::current(),
        }
    }

    /// Load `scene` and put it in front of the others
    pub fn add_scene(&mut self, backend: &mut B, mut scene: BoxedScene<B>) -> EngineResult<SceneId> {
        self.thread.assert_current("SceneManager::add_scene");
        let mut ctx = SceneContext {
            backend,
            resources: &mut self.resources,
            removals: &mut self.removals,
        };
        scene.load(&mut ctx)?;
        let id = SceneId(self.next_id);
        self.next_id += 1;
        self.scenes.insert(id, scene);
        self.order.insert(0, id);
        log::debug!("[SceneManager::add_scene] Added {:?}", id);
        Ok(id)
    }

    /// Schedule removal at the end of the next `update`
    pub fn remove_scene(&mut self, id: SceneId) -> EngineResult<()> {
        if !self.scenes.contains_key(&id) {
            return Err(EngineError::SceneNotFound { id: id.0 });
        }
        if !self.removals.contains(&id) {
            self.removals.push(id);
        }
        Ok(())
    }

    /// Build a scene on a worker thread; it is added by `poll_pending`
    /// once ready
    pub fn spawn_scene<F>(&mut self, name: &str, build: F) -> EngineResult<()>
    where
        B: 'static,
        F: FnOnce() -> EngineResult<SendScene<B>> + Send + 'static,
    {
        self.pending.push(SceneLoad::spawn(name, build)?);
        Ok(())
    }

    /// Add every background scene that finished. Failures are dropped from
    /// the pending set; the first one is returned after the rest are handled.
    pub fn poll_pending(&mut self, backend: &mut B) -> EngineResult<Vec<SceneId>> {
        let mut added = Vec::new();
        let mut first_error = None;
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for mut load in std::mem::take(&mut self.pending) {
            match load.poll() {
                LoadState::Pending => still_pending.push(load),
                LoadState::Ready(scene) => match self.add_scene(backend, scene) {
                    Ok(id) => added.push(id),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                },
                LoadState::Failed(e) => {
                    log::warn!("[SceneManager::poll_pending] Scene load failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        self.pending = still_pending;
        match first_error {
            Some(e) => Err(e),
            None => Ok(added),
        }
    }

    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Update every scene newest first, then apply deferred removals
    pub fn update(&mut self, backend: &mut B) -> EngineResult<()> {
        self.thread.assert_current("SceneManager::update");
        for id in self.order.clone() {
            if let Some(scene) = self.scenes.get_mut(&id) {
                let mut ctx = SceneContext {
                    backend: &mut *backend,
                    resources: &mut self.resources,
                    removals: &mut self.removals,
                };
                scene.update(id, &mut ctx)?;
            }
        }

        // Every queued removal is applied; the first unload error is
        // returned afterwards.
        let mut first_error = None;
        for id in std::mem::take(&mut self.removals) {
            let Some(mut scene) = self.scenes.remove(&id) else {
                log::warn!("[SceneManager::update] Ignoring removal of unknown {:?}", id);
                continue;
            };
            self.order.retain(|other| *other != id);
            let mut ctx = SceneContext {
                backend: &mut *backend,
                resources: &mut self.resources,
                removals: &mut self.removals,
            };
            match scene.unload(&mut ctx) {
                Ok(()) => log::debug!("[SceneManager::update] Removed {:?}", id),
                Err(e) => {
                    log::error!("[SceneManager::update] Unloading {:?} failed: {}", id, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn render(&mut self, backend: &mut B) -> EngineResult<()> {
        self.thread.assert_current("SceneManager::render");
        for id in &self.order {
            if let Some(scene) = self.scenes.get_mut(id) {
                let mut ctx = SceneContext {
                    backend: &mut *backend,
                    resources: &mut self.resources,
                    removals: &mut self.removals,
                };
                scene.render(&mut ctx)?;
            }
        }
        Ok(())
    }

    /// Unload every scene and free all shared resources
    pub fn delete(&mut self, backend: &mut B) -> EngineResult<()> {
        for id in std::mem::take(&mut self.order) {
            if let Some(mut scene) = self.scenes.remove(&id) {
                let mut ctx = SceneContext {
                    backend: &mut *backend,
                    resources: &mut self.resources,
                    removals: &mut self.removals,
                };
                scene.unload(&mut ctx)?;
            }
        }
        self.removals.clear();
        self.pending.clear();
        self.resources.delete(backend);
        Ok(())
    }

    /// Scene ids newest first
    pub fn scene_ids(&self) -> &[SceneId] {
        &self.order
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessBackend;
    use crate::renderer::Geometry;
    use crate::scene::Resource;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Holds one shared geometry and can remove itself after N updates
    struct TestScene {
        name: &'static str,
        log: Log,
        remove_after: Option<usize>,
        updates: usize,
        queued: Vec<SceneId>,
    }

    impl TestScene {
        fn boxed(name: &'static str, log: &Log, remove_after: Option<usize>) -> Box<Self> {
            Box::new(Self {
                name,
                log: log.clone(),
                remove_after,
                updates: 0,
                queued: Vec::new(),
            })
        }

        fn removing(mut self: Box<Self>, ids: &[SceneId]) -> Box<Self> {
            self.queued = ids.to_vec();
            self
        }

        fn record(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", self.name, event));
        }
    }

    impl Scene<HeadlessBackend> for TestScene {
        fn load(&mut self, ctx: &mut SceneContext<'_, HeadlessBackend>) -> EngineResult<()> {
            ctx.resources.get(&mut *ctx.backend, "square", |backend| {
                let mut geometry = Geometry::square();
                geometry.upload(backend)?;
                Ok(Resource::Geometry(geometry))
            })?;
            self.record("load");
            Ok(())
        }

        fn unload(&mut self, ctx: &mut SceneContext<'_, HeadlessBackend>) -> EngineResult<()> {
            ctx.resources.release(&mut *ctx.backend, "square")?;
            self.record("unload");
            Ok(())
        }

        fn update(&mut self, id: SceneId, ctx: &mut SceneContext<'_, HeadlessBackend>) -> EngineResult<()> {
            self.updates += 1;
            self.record("update");
            if self.remove_after == Some(self.updates) {
                ctx.remove_scene(id);
            }
            for other in self.queued.drain(..) {
                ctx.remove_scene(other);
            }
            Ok(())
        }

        fn render(&mut self, _ctx: &mut SceneContext<'_, HeadlessBackend>) -> EngineResult<()> {
            self.record("render");
            Ok(())
        }
    }

    fn take(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[test]
    fn test_newest_first_and_shared_resources() {
        let log = Log::default();
        let mut backend = HeadlessBackend::new();
        let mut manager = SceneManager::default();
        let a = manager.add_scene(&mut backend, TestScene::boxed("a", &log, None)).unwrap();
        let b = manager.add_scene(&mut backend, TestScene::boxed("b", &log, None)).unwrap();
        assert_eq!(manager.scene_ids(), &[b, a]);
        assert_eq!(manager.resources().ref_count("square"), 2);
        assert_eq!(backend.live_buffers(), 1);

        take(&log);
        manager.render(&mut backend).unwrap();
        assert_eq!(take(&log), vec!["b:render", "a:render"]);
    }

    #[test]
    fn test_removal_is_deferred() {
        let log = Log::default();
        let mut backend = HeadlessBackend::new();
        let mut manager = SceneManager::default();
        let a = manager.add_scene(&mut backend, TestScene::boxed("a", &log, None)).unwrap();
        let b = manager.add_scene(&mut backend, TestScene::boxed("b", &log, Some(1))).unwrap();
        take(&log);

        manager.remove_scene(a).unwrap();
        assert_eq!(manager.scene_ids(), &[b, a]);
        manager.update(&mut backend).unwrap();
        assert_eq!(
            take(&log),
            vec!["b:update", "a:update", "a:unload", "b:unload"]
        );
        assert!(manager.scene_ids().is_empty());
        assert_eq!(backend.live_buffers(), 0);
        assert!(matches!(
            manager.remove_scene(a),
            Err(EngineError::SceneNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_removal_does_not_block_others() {
        let log = Log::default();
        let mut backend = HeadlessBackend::new();
        let mut manager = SceneManager::default();
        let victim = manager.add_scene(&mut backend, TestScene::boxed("victim", &log, None)).unwrap();
        let remover = TestScene::boxed("remover", &log, None).removing(&[SceneId(999), victim]);
        let remover = manager.add_scene(&mut backend, remover).unwrap();
        take(&log);

        manager.update(&mut backend).unwrap();
        assert_eq!(
            take(&log),
            vec!["remover:update", "victim:update", "victim:unload"]
        );
        assert_eq!(manager.scene_ids(), &[remover]);
        assert_eq!(manager.resources().ref_count("square"), 1);
    }

    #[test]
    fn test_delete_unloads_everything() {
        let log = Log::default();
        let mut backend = HeadlessBackend::new();
        let mut manager = SceneManager::default();
        manager.add_scene(&mut backend, TestScene::boxed("a", &log, None)).unwrap();
        manager.add_scene(&mut backend, TestScene::boxed("b", &log, None)).unwrap();
        manager.delete(&mut backend).unwrap();
        assert!(manager.scene_ids().is_empty());
        assert!(manager.resources().is_empty());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_background_scene_is_swapped_in() {
        let log = Log::default();
        let mut backend = HeadlessBackend::new();
        let mut manager = SceneManager::default();
        let worker_log = log.clone();
        manager
            .spawn_scene("level", move || {
                Ok(TestScene::boxed("level", &worker_log, None) as SendScene<HeadlessBackend>)
            })
            .unwrap();
        manager
            .spawn_scene("broken", || {
                Err(EngineError::SceneLoadFailed("missing".to_string()))
            })
            .unwrap();

        let start = Instant::now();
        let mut failures = 0;
        while manager.pending_loads() > 0 && start.elapsed() < Duration::from_secs(5) {
            if manager.poll_pending(&mut backend).is_err() {
                failures += 1;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(failures, 1);
        assert_eq!(manager.scene_ids().len(), 1);
        assert_eq!(take(&log), vec!["level:load"]);
    }
}
