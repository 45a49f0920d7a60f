/// Camera Module - Data-Oriented Programming (DOP) style
///
/// - camera_data.rs: Pure data structures with NO methods
/// - camera_operations.rs: Pure functions that operate on data
///
/// The camera is a 2D orthographic view over an axis-aligned world box.

pub mod camera_data;
pub mod camera_operations;

// Re-export data structures
pub use camera_data::{CameraData, CameraUniform};

// Re-export all operations
pub use camera_operations::{
    // Initialization
    create_camera,

    // Configuration
    set_screen_size,
    set_world_bounds,

    // View/projection
    build_camera_uniform,
    build_projection_matrix,

    // Coordinate conversion
    screen_to_world,
    world_to_screen,
};
