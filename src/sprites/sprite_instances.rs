//! Sprite instances: an instance list whose frames come from a sheet

use super::sheet_data::SheetData;
use super::sheet_operations;
use crate::error::EngineResult;
use crate::instance::{self, InstanceHandle, InstanceListData};

#[derive(Debug)]
pub struct SpriteInstanceList {
    pub list: InstanceListData,
    pub pixels_per_unit: f32,
}

impl SpriteInstanceList {
    pub fn new(pixels_per_unit: f32) -> Self {
        Self {
            list: instance::create_instance_list(),
            pixels_per_unit,
        }
    }

    pub fn new_instance(&mut self) -> InstanceHandle {
        instance::new_instance(&mut self.list)
    }

    /// Show sprite `key` on the instance, sized to the sprite's pixel
    /// dimensions at this list's pixels-per-unit
    pub fn set_frame(
        &mut self,
        sheet: &SheetData,
        handle: InstanceHandle,
        key: &str,
    ) -> EngineResult<()> {
        let sprite = sheet_operations::sprite(sheet, key)?;
        let item = instance::get_mut(&mut self.list, handle)?;
        item.frame = sprite.index() as u32;
        instance::set_scale(item, sprite.world_dimensions(self.pixels_per_unit).extend(1.0));
        instance::mark_changed(item);
        item.key = Some(key.to_string());
        Ok(())
    }

    pub fn list_mut(&mut self) -> &mut InstanceListData {
        &mut self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_set_frame() {
        let mut sheet = sheet_operations::create_sheet();
        sheet_operations::add_sprite(&mut sheet, "idle", Vec2::new(16.0, 16.0), Vec2::ZERO).unwrap();
        sheet_operations::add_sprite(&mut sheet, "run", Vec2::new(64.0, 32.0), Vec2::new(16.0, 0.0))
            .unwrap();

        let mut sprites = SpriteInstanceList::new(32.0);
        let handle = sprites.new_instance();
        sprites.set_frame(&sheet, handle, "run").unwrap();

        let item = instance::get(&sprites.list, handle).unwrap();
        assert_eq!(item.frame, 1);
        assert_eq!(item.scale, Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(item.key.as_deref(), Some("run"));
        assert!(item.dirty);
    }

    #[test]
    fn test_set_frame_errors() {
        let sheet = sheet_operations::create_sheet();
        let mut sprites = SpriteInstanceList::new(32.0);
        let handle = sprites.new_instance();
        assert!(matches!(
            sprites.set_frame(&sheet, handle, "nope"),
            Err(EngineError::UnknownKey { .. })
        ));

        let mut sheet = sheet;
        sheet_operations::add_sprite(&mut sheet, "a", Vec2::ONE, Vec2::ZERO).unwrap();
        instance::remove(&mut sprites.list, handle).unwrap();
        assert!(matches!(
            sprites.set_frame(&sheet, handle, "a"),
            Err(EngineError::StaleHandle { .. })
        ));
    }
}
