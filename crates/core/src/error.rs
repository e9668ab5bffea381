//! Core Error Types
//!
//! Defines the foundational error types used across the Prose Cascade workspace.
//! These error types only depend on thiserror + serde_json to keep the core
//! crate lightweight.
//!
//! The root crate extends these with configuration and construction errors
//! that require heavier dependencies.

use thiserror::Error;

/// Core error type for the Prose Cascade workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted state could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
