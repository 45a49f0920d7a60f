//! Unified error handling for jam-kit
//!
//! Every fallible operation returns [`EngineResult`]. Errors are returned
//! synchronously; the only automatic retry in the crate is the single repack
//! the text cache performs when its atlas is exhausted.

use thiserror::Error;

/// Main error type for jam-kit
#[derive(Debug, Error)]
pub enum EngineError {
    // Atlas Errors
    #[error("Atlas full: cannot fit '{key}' ({width}x{height})")]
    AtlasFull {
        key: String,
        width: u32,
        height: u32,
    },
    #[error("Sprite sheet out of slots (max: {max})")]
    TooManySprites { max: usize },
    #[error("Invalid sprite key: {key}")]
    UnknownKey { key: String },
    #[error("No texture associated with sheet during {context}")]
    MissingTexture { context: String },

    // Camera Errors
    #[error("Projection matrix not invertible")]
    ProjectionNotInvertible,
    #[error("Invalid screen size {width}x{height}")]
    InvalidScreenSize { width: f32, height: f32 },

    // Instance Errors
    #[error("Stale instance handle: slot {index}")]
    StaleHandle { index: u32 },

    // GPU Errors
    #[error("Graphics operation '{operation}' failed: {error}")]
    Graphics { operation: String, error: String },

    // Scene / Resource Errors
    #[error("Resource not found: {key}")]
    ResourceNotFound { key: String },
    #[error("Scene not found: {id}")]
    SceneNotFound { id: u32 },
    #[error("Scene load failed: {0}")]
    SceneLoadFailed(String),

    // Asset Errors
    #[error("Manifest error for {path}: {error}")]
    Manifest { path: String, error: String },
    #[error("Invalid config: {field} ({reason})")]
    Config { field: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic fallback for unexpected errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    /// True for the errors that a repack can cure: no room left in the
    /// pixel buffer, or no slots left in the lookup table.
    pub fn is_atlas_exhausted(&self) -> bool {
        matches!(
            self,
            EngineError::AtlasFull { .. } | EngineError::TooManySprites { .. }
        )
    }

    pub fn graphics(operation: &str, error: impl ToString) -> Self {
        EngineError::Graphics {
            operation: operation.to_string(),
            error: error.to_string(),
        }
    }

    pub fn config(field: &str, reason: impl ToString) -> Self {
        EngineError::Config {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Type alias for Results in jam-kit
pub type EngineResult<T> = Result<T, EngineError>;

// Helper functions for common error patterns

/// Convert Option to Result with context
pub trait OptionExt<T> {
    fn ok_or_engine<F>(self, f: F) -> EngineResult<T>
    where
        F: FnOnce() -> EngineError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_engine<F>(self, f: F) -> EngineResult<T>
    where
        F: FnOnce() -> EngineError,
    {
        self.ok_or_else(f)
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> EngineResult<T>;
    fn with_context<F>(self, f: F) -> EngineResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> EngineResult<T> {
        self.map_err(|e| EngineError::Internal {
            message: format!("{}: {}", msg, e),
        })
    }

    fn with_context<F>(self, f: F) -> EngineResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| EngineError::Internal {
            message: format!("{}: {}", f(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::AtlasFull {
            key: "hello".to_string(),
            width: 10,
            height: 5,
        };
        assert_eq!(err.to_string(), "Atlas full: cannot fit 'hello' (10x5)");
    }

    #[test]
    fn test_atlas_exhaustion_grouping() {
        assert!(EngineError::TooManySprites { max: 4 }.is_atlas_exhausted());
        assert!(!EngineError::UnknownKey {
            key: "x".to_string()
        }
        .is_atlas_exhausted());
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_engine(|| EngineError::Internal {
            message: "test".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_error_context() {
        let result: Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        let with_context = result.context("loading config");
        match with_context {
            Err(EngineError::Internal { message }) => {
                assert!(message.starts_with("loading config"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
