//! Instance Operations - Pure DOP Functions
//!
//! Prepend, remove and head access are O(1). Traversal runs head to tail,
//! which is newest to oldest.

use super::instance_data::{Instance, InstanceHandle, InstanceListData, InstanceSlot};
use crate::error::{EngineError, EngineResult};
use glam::{Mat4, Vec3, Vec4};

// ============================================================================
// INSTANCE
// ============================================================================

pub fn set_position(instance: &mut Instance, position: Vec3) {
    if instance.position != position {
        instance.position = position;
        instance.dirty = true;
    }
}

pub fn set_scale(instance: &mut Instance, scale: Vec3) {
    if instance.scale != scale {
        instance.scale = scale;
        instance.dirty = true;
    }
}

/// Rotation in degrees around Z
pub fn set_rotation(instance: &mut Instance, degrees: f32) {
    if instance.rotation != degrees {
        instance.rotation = degrees;
        instance.dirty = true;
    }
}

/// Color is read straight into the instance stream; the model matrix
/// stays cached.
pub fn set_color(instance: &mut Instance, color: Vec4) {
    instance.color = color;
}

pub fn mark_changed(instance: &mut Instance) {
    instance.dirty = true;
}

/// Cached model matrix, rebuilt first if the instance is dirty
pub fn model_matrix(instance: &mut Instance) -> Mat4 {
    if instance.dirty {
        instance.model = Mat4::from_translation(instance.position)
            * Mat4::from_rotation_z(instance.rotation.to_radians())
            * Mat4::from_scale(instance.scale);
        instance.dirty = false;
    }
    instance.model
}

// ============================================================================
// LIST
// ============================================================================

pub fn create_instance_list() -> InstanceListData {
    InstanceListData::default()
}

/// Prepend a default instance and return its handle
pub fn new_instance(list: &mut InstanceListData) -> InstanceHandle {
    prepend(list, Instance::default())
}

/// Insert `instance` at the head of the list
pub fn prepend(list: &mut InstanceListData, instance: Instance) -> InstanceHandle {
    let next = list.head;
    let index = match list.free.pop() {
        Some(index) => {
            let slot = &mut list.slots[index as usize];
            slot.instance = Some(instance);
            slot.prev = None;
            slot.next = next;
            index
        }
        None => {
            list.slots.push(InstanceSlot {
                generation: 0,
                instance: Some(instance),
                prev: None,
                next,
            });
            (list.slots.len() - 1) as u32
        }
    };
    if let Some(next) = next {
        list.slots[next as usize].prev = Some(index);
    }
    list.head = Some(index);
    list.len += 1;
    InstanceHandle {
        index,
        generation: list.slots[index as usize].generation,
    }
}

fn live_slot(list: &InstanceListData, handle: InstanceHandle) -> Option<&InstanceSlot> {
    list.slots
        .get(handle.index as usize)
        .filter(|slot| slot.generation == handle.generation && slot.instance.is_some())
}

pub fn contains(list: &InstanceListData, handle: InstanceHandle) -> bool {
    live_slot(list, handle).is_some()
}

fn stale(handle: InstanceHandle) -> EngineError {
    EngineError::StaleHandle {
        index: handle.index,
    }
}

pub fn get(list: &InstanceListData, handle: InstanceHandle) -> EngineResult<&Instance> {
    live_slot(list, handle)
        .and_then(|slot| slot.instance.as_ref())
        .ok_or_else(|| stale(handle))
}

pub fn get_mut(list: &mut InstanceListData, handle: InstanceHandle) -> EngineResult<&mut Instance> {
    list.slots
        .get_mut(handle.index as usize)
        .filter(|slot| slot.generation == handle.generation)
        .and_then(|slot| slot.instance.as_mut())
        .ok_or_else(|| stale(handle))
}

/// Unlink and return the instance; the handle is stale afterwards
pub fn remove(list: &mut InstanceListData, handle: InstanceHandle) -> EngineResult<Instance> {
    if !contains(list, handle) {
        return Err(stale(handle));
    }
    let slot = &mut list.slots[handle.index as usize];
    let (prev, next) = (slot.prev.take(), slot.next.take());
    let instance = slot.instance.take().ok_or_else(|| stale(handle))?;
    slot.generation = slot.generation.wrapping_add(1);

    match prev {
        Some(prev) => list.slots[prev as usize].next = next,
        None => list.head = next,
    }
    if let Some(next) = next {
        list.slots[next as usize].prev = prev;
    }
    list.free.push(handle.index);
    list.len -= 1;
    Ok(instance)
}

fn handle_at(list: &InstanceListData, index: u32) -> InstanceHandle {
    InstanceHandle {
        index,
        generation: list.slots[index as usize].generation,
    }
}

/// Most recently prepended instance
pub fn head(list: &InstanceListData) -> Option<InstanceHandle> {
    list.head.map(|index| handle_at(list, index))
}

/// Instance after `handle` in traversal order
pub fn next(list: &InstanceListData, handle: InstanceHandle) -> Option<InstanceHandle> {
    live_slot(list, handle)
        .and_then(|slot| slot.next)
        .map(|index| handle_at(list, index))
}

pub fn len(list: &InstanceListData) -> usize {
    list.len
}

pub fn is_empty(list: &InstanceListData) -> bool {
    list.len == 0
}

/// Handles in traversal order
pub fn handles(list: &InstanceListData) -> Vec<InstanceHandle> {
    iter(list).map(|(handle, _)| handle).collect()
}

pub fn iter(list: &InstanceListData) -> InstanceIter<'_> {
    InstanceIter {
        list,
        cursor: list.head,
    }
}

/// Remove every instance. Outstanding handles go stale.
pub fn clear(list: &mut InstanceListData) {
    while let Some(handle) = head(list) {
        if remove(list, handle).is_err() {
            break;
        }
    }
}

/// Head-to-tail iterator over `(handle, instance)`
pub struct InstanceIter<'a> {
    list: &'a InstanceListData,
    cursor: Option<u32>,
}

impl<'a> Iterator for InstanceIter<'a> {
    type Item = (InstanceHandle, &'a Instance);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.list.slots[index as usize];
        self.cursor = slot.next;
        let instance = slot.instance.as_ref()?;
        Some((handle_at(self.list, index), instance))
    }
}
