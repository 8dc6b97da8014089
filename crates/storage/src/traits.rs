//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use foliant_core::RevisionTag;

/// An object together with the revision tag observed reading it.
#[derive(Clone, Debug)]
pub struct Object {
    pub data: Bytes,
    pub revision: RevisionTag,
    pub meta: ObjectMeta,
}

/// Metadata about a stored object.
#[derive(Clone, Debug, Default)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time (if the backend reports one).
    pub last_modified: Option<time::OffsetDateTime>,
    /// Content type (if the backend stores one).
    pub content_type: Option<String>,
}

/// Precondition attached to a write.
///
/// The conditional write is the sole serialization point of the system:
/// there is no client-side lock object. A failed condition is reported
/// atomically as `StorageError::PreconditionFailed`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PutCondition {
    /// Unconditional write.
    Overwrite,
    /// Succeed only if the stored tag equals this one.
    IfMatch(RevisionTag),
    /// Succeed only if the key does not currently exist.
    IfAbsent,
}

/// Options for a write.
#[derive(Clone, Debug)]
pub struct PutOptions {
    pub condition: PutCondition,
    pub content_type: Option<String>,
}

impl PutOptions {
    pub fn overwrite() -> Self {
        Self {
            condition: PutCondition::Overwrite,
            content_type: None,
        }
    }

    pub fn if_match(tag: RevisionTag) -> Self {
        Self {
            condition: PutCondition::IfMatch(tag),
            content_type: None,
        }
    }

    pub fn if_absent() -> Self {
        Self {
            condition: PutCondition::IfAbsent,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl Default for PutOptions {
    fn default() -> Self {
        Self::overwrite()
    }
}

/// Object store abstraction with revision-tagged reads and conditional writes.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's metadata without fetching content.
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta>;

    /// Get an object's content and current revision tag.
    async fn get(&self, key: &str) -> StorageResult<Object>;

    /// Write an object, honoring the given precondition, and return the new
    /// revision tag.
    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<RevisionTag>;

    /// Delete an object. Returns `NotFound` if it does not exist.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// List object keys with a prefix, in lexicographic order.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Static identifier for the backend type, used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify backend connectivity. The default implementation returns
    /// `Ok(())`, suitable for backends without remote dependencies.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
