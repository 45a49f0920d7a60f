//! GPU thread affinity
//!
//! Graphics-context calls belong to the thread that created the backend.
//! Crossing threads is a programmer error, caught in debug builds.

use std::thread::{self, ThreadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuThread {
    owner: ThreadId,
}

impl GpuThread {
    /// Claim the calling thread
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    #[track_caller]
    pub fn assert_current(&self, operation: &str) {
        debug_assert!(
            self.is_current(),
            "GPU operation '{}' called off the graphics thread",
            operation
        );
    }
}
