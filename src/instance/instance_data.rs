//! Instance Data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in instance_operations.rs

use glam::{Mat4, Vec3, Vec4};

/// Generational handle into an [`InstanceListData`]
///
/// A handle goes stale when its instance is removed; the slot may be reused
/// but the generation will not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    pub(super) index: u32,
    pub(super) generation: u32,
}

/// One drawable occurrence of a geometry
///
/// `dirty` invalidates the cached model matrix; it is rebuilt on the next
/// read as translate * rotate_z * scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub position: Vec3,
    pub scale: Vec3,
    /// Degrees around Z
    pub rotation: f32,
    pub color: Vec4,
    /// Slot in the bound sheet's lookup table
    pub frame: u32,
    /// Sprite key or text this instance currently shows
    pub key: Option<String>,
    pub dirty: bool,
    pub model: Mat4,
}

impl Default for Instance {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: 0.0,
            color: Vec4::ZERO,
            frame: 0,
            key: None,
            dirty: true,
            model: Mat4::IDENTITY,
        }
    }
}

#[derive(Debug)]
pub(super) struct InstanceSlot {
    pub generation: u32,
    pub instance: Option<Instance>,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

/// Ordered pool of instances, newest first
///
/// Slots live in one dense vector; removed slots go on a free list and are
/// reused by later prepends. Links are slot indices, never references.
#[derive(Debug, Default)]
pub struct InstanceListData {
    pub(super) slots: Vec<InstanceSlot>,
    pub(super) free: Vec<u32>,
    pub(super) head: Option<u32>,
    pub(super) len: usize,
}
