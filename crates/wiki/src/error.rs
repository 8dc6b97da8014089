//! Wiki-level error types.

use foliant_core::Action;
use foliant_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the repositories, managers, and the facade.
///
/// Edit conflicts on page saves are NOT errors: they come back as
/// [`SaveOutcome::Conflict`](crate::SaveOutcome) so callers can merge.
/// Concurrent config saves and exhausted index retries, which have no
/// merge story, are errors.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("permission denied: {action}")]
    PermissionDenied { action: Action },

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Another admin saved the configuration since it was loaded.
    #[error("configuration was modified concurrently; reload and retry")]
    ConfigConflict,

    /// The index read-modify-write cycle lost the race on every attempt.
    /// The page objects themselves are intact; a reindex reconciles.
    #[error("metadata index update failed after {attempts} attempts")]
    MetadataUpdateConflict { attempts: u32 },

    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("file type not allowed: {0}")]
    InvalidFileType(String),

    #[error("page {page} already references {limit} files")]
    FileQuotaReached { page: String, limit: usize },

    #[error("page limit reached: {limit}")]
    PageLimitReached { limit: usize },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<foliant_core::Error> for WikiError {
    fn from(err: foliant_core::Error) -> Self {
        use foliant_core::Error;
        match err {
            Error::InvalidPagePath(s) | Error::InvalidFileId(s) | Error::InvalidFilename(s) => {
                WikiError::InvalidPath(s)
            }
            Error::Config(s) => WikiError::Config(s),
            Error::Serialization(e) => WikiError::Serialization(e),
        }
    }
}

/// Result type for wiki operations.
pub type WikiResult<T> = std::result::Result<T, WikiError>;
