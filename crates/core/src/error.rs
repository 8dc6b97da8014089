//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid page path: {0}")]
    InvalidPagePath(String),

    #[error("invalid file id: {0}")]
    InvalidFileId(String),

    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
