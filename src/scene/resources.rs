//! Reference-counted resources shared between scenes
//!
//! The first `get` for a key runs its loader; later calls only bump the
//! count. `release` decrements and frees the GPU side at zero.

use crate::error::{EngineError, EngineResult};
use crate::gpu::GraphicsBackend;
use crate::renderer::Geometry;
use crate::sprites::{self, PackedSheetData, SheetData};
use rustc_hash::FxHashMap;

pub type ResourceKey = String;

/// Anything a scene can share through [`Resources`]
#[derive(Debug)]
pub enum Resource {
    Sheet(SheetData),
    PackedSheet(PackedSheetData),
    Geometry(Geometry),
}

impl Resource {
    fn delete<B: GraphicsBackend>(&mut self, backend: &mut B) {
        match self {
            Resource::Sheet(sheet) => sprites::delete_sheet(sheet, backend),
            Resource::PackedSheet(packed) => sprites::delete_packed_sheet(packed, backend),
            Resource::Geometry(geometry) => geometry.delete(backend),
        }
    }
}

#[derive(Debug)]
struct ResourceEntry {
    resource: Resource,
    refs: usize,
}

#[derive(Debug, Default)]
pub struct Resources {
    entries: FxHashMap<ResourceKey, ResourceEntry>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reference to `key`, loading it first if nobody holds it
    pub fn get<B, F>(&mut self, backend: &mut B, key: &str, load: F) -> EngineResult<&mut Resource>
    where
        B: GraphicsBackend,
        F: FnOnce(&mut B) -> EngineResult<Resource>,
    {
        if !self.entries.contains_key(key) {
            let resource = load(backend)?;
            log::debug!("[Resources::get] Loaded '{}'", key);
            self.entries
                .insert(key.to_string(), ResourceEntry { resource, refs: 0 });
        }
        let entry = self.entries.get_mut(key).ok_or_else(|| not_found(key))?;
        entry.refs += 1;
        Ok(&mut entry.resource)
    }

    /// Borrow a loaded resource without changing its count
    pub fn resource_mut(&mut self, key: &str) -> EngineResult<&mut Resource> {
        self.entries
            .get_mut(key)
            .map(|entry| &mut entry.resource)
            .ok_or_else(|| not_found(key))
    }

    pub fn sheet_mut(&mut self, key: &str) -> EngineResult<&mut SheetData> {
        match self.resource_mut(key)? {
            Resource::Sheet(sheet) => Ok(sheet),
            Resource::PackedSheet(packed) => Ok(&mut packed.sheet),
            Resource::Geometry(_) => Err(not_found(key)),
        }
    }

    pub fn geometry_mut(&mut self, key: &str) -> EngineResult<&mut Geometry> {
        match self.resource_mut(key)? {
            Resource::Geometry(geometry) => Ok(geometry),
            _ => Err(not_found(key)),
        }
    }

    /// Drop one reference, deleting the resource when none remain
    pub fn release<B: GraphicsBackend>(&mut self, backend: &mut B, key: &str) -> EngineResult<()> {
        let entry = self.entries.get_mut(key).ok_or_else(|| not_found(key))?;
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            if let Some(mut entry) = self.entries.remove(key) {
                entry.resource.delete(backend);
                log::debug!("[Resources::release] Deleted '{}'", key);
            }
        }
        Ok(())
    }

    pub fn ref_count(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, |entry| entry.refs)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delete everything regardless of counts
    pub fn delete<B: GraphicsBackend>(&mut self, backend: &mut B) {
        for (_, mut entry) in self.entries.drain() {
            entry.resource.delete(backend);
        }
    }
}

fn not_found(key: &str) -> EngineError {
    EngineError::ResourceNotFound {
        key: key.to_string(),
    }
}
