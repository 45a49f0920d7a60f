//! Instance list
//!
//! Per-instance transform, color and frame records in an arena-backed list
//! addressed by generational handles.

// Data structures
pub mod instance_data;
// Pure functions
pub mod instance_operations;

pub use instance_data::{Instance, InstanceHandle, InstanceListData};
pub use instance_operations::*;
