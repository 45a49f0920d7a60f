//! Camera operations - Pure DOP functions
//!
//! All functions are pure: they take data, return new data, no side effects.
//! No methods, no self, just transformations.

use super::camera_data::{CameraData, CameraUniform};
use crate::error::{EngineError, EngineResult};
use glam::{Mat4, Vec2, Vec3, Vec4};

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Create a camera looking at `world_center`, showing `world_size` units
pub fn create_camera(
    world_center: Vec3,
    world_size: Vec3,
    screen_size: Vec2,
) -> EngineResult<CameraData> {
    let camera = CameraData {
        world_center,
        world_size,
        screen_size,
        px_per_unit: Vec2::ZERO,
        projection: Mat4::IDENTITY,
        view: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
    };
    let camera = set_screen_size(&camera, screen_size)?;
    set_world_bounds(&camera, world_center, world_size)
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Update screen size (e.g., on window resize)
///
/// Both sides must be positive and finite; pixel/world conversion divides
/// by them.
pub fn set_screen_size(camera: &CameraData, screen_size: Vec2) -> EngineResult<CameraData> {
    if !(screen_size.x > 0.0 && screen_size.y > 0.0 && screen_size.is_finite()) {
        log::warn!("[camera::set_screen_size] Rejected screen size {:?}", screen_size);
        return Err(EngineError::InvalidScreenSize {
            width: screen_size.x,
            height: screen_size.y,
        });
    }
    let mut new_camera = *camera;
    new_camera.screen_size = screen_size;
    new_camera.px_per_unit = calc_px_per_unit(screen_size, new_camera.world_size);
    Ok(new_camera)
}

/// Rebuild the projection for a new world box
///
/// Fails when the box is degenerate on any axis, since the projection then
/// has no inverse.
pub fn set_world_bounds(
    camera: &CameraData,
    world_center: Vec3,
    world_size: Vec3,
) -> EngineResult<CameraData> {
    let mut new_camera = *camera;
    new_camera.world_center = world_center;
    new_camera.world_size = world_size;
    new_camera.px_per_unit = calc_px_per_unit(new_camera.screen_size, world_size);

    let projection = build_projection_matrix(world_center, world_size);
    let determinant = projection.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        log::warn!(
            "[camera::set_world_bounds] Degenerate world bounds center={:?} size={:?}",
            world_center,
            world_size
        );
        return Err(EngineError::ProjectionNotInvertible);
    }
    new_camera.projection = projection;
    new_camera.inverse = projection.inverse();
    Ok(new_camera)
}

fn calc_px_per_unit(screen_size: Vec2, world_size: Vec3) -> Vec2 {
    Vec2::new(
        screen_size.x / world_size.x,
        screen_size.y / world_size.y,
    )
}

// ============================================================================
// VIEW/PROJECTION MATRICES
// ============================================================================

/// Orthographic projection over `center ± size/2`, near plane at the box's
/// max z and far plane at its min z
pub fn build_projection_matrix(world_center: Vec3, world_size: Vec3) -> Mat4 {
    let half = world_size * 0.5;
    let min = world_center - half;
    let max = world_center + half;
    Mat4::orthographic_rh(min.x, max.x, min.y, max.y, max.z, min.z)
}

/// Build camera uniform for GPU
pub fn build_camera_uniform(camera: &CameraData) -> CameraUniform {
    CameraUniform {
        view_matrix: camera.view.to_cols_array_2d(),
        projection_matrix: camera.projection.to_cols_array_2d(),
    }
}

// ============================================================================
// COORDINATE CONVERSION
// ============================================================================

/// Convert a pixel position (origin top-left, y down) to world units
pub fn screen_to_world(camera: &CameraData, screen: Vec2) -> Vec2 {
    let half = camera.screen_size * 0.5;
    let ndc = Vec2::new((screen.x - half.x) / half.x, (half.y - screen.y) / half.y);
    let out = camera.inverse * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
    let out = out / out.w;
    Vec2::new(out.x, out.y)
}

/// Convert a world position to pixels (origin top-left, y down)
pub fn world_to_screen(camera: &CameraData, world: Vec2) -> Vec2 {
    let ndc = camera.projection * Vec4::new(world.x, world.y, 1.0, 1.0);
    let half = camera.screen_size * 0.5;
    Vec2::new(ndc.x * half.x + half.x, half.y - ndc.y * half.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraData {
        create_camera(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(20.0, 10.0, 2.0),
            Vec2::new(800.0, 400.0),
        )
        .unwrap()
    }

    #[test]
    fn test_px_per_unit() {
        assert_eq!(camera().px_per_unit, Vec2::new(40.0, 40.0));
    }

    #[test]
    fn test_degenerate_bounds_fail() {
        let result = create_camera(Vec3::ZERO, Vec3::new(20.0, 10.0, 0.0), Vec2::new(800.0, 400.0));
        assert!(matches!(result, Err(EngineError::ProjectionNotInvertible)));
    }

    #[test]
    fn test_screen_corners_map_to_world_box() {
        let camera = camera();
        let top_left = screen_to_world(&camera, Vec2::new(0.0, 0.0));
        assert!((top_left - Vec2::new(-10.0, 5.0)).length() < 1e-4);
        let center = screen_to_world(&camera, Vec2::new(400.0, 200.0));
        assert!(center.length() < 1e-4);
    }

    #[test]
    fn test_world_screen_round_trip() {
        let camera = camera();
        let world = Vec2::new(3.5, -2.0);
        let back = screen_to_world(&camera, world_to_screen(&camera, world));
        assert!((back - world).length() < 1e-4);
    }

    #[test]
    fn test_zero_screen_size_fails() {
        let camera = camera();
        for size in [Vec2::new(0.0, 400.0), Vec2::new(800.0, 0.0), Vec2::new(f32::NAN, 1.0)] {
            assert!(matches!(
                set_screen_size(&camera, size),
                Err(EngineError::InvalidScreenSize { .. })
            ));
        }
        assert!(matches!(
            create_camera(Vec3::ZERO, Vec3::new(20.0, 10.0, 2.0), Vec2::ZERO),
            Err(EngineError::InvalidScreenSize { .. })
        ));
    }

    #[test]
    fn test_resize_keeps_projection() {
        let camera = camera();
        let resized = set_screen_size(&camera, Vec2::new(1600.0, 800.0)).unwrap();
        assert_eq!(resized.projection, camera.projection);
        assert_eq!(resized.px_per_unit, Vec2::new(80.0, 80.0));
    }
}
