//! Object-store wrappers that inject failures on the index key.

use async_trait::async_trait;
use bytes::Bytes;
use foliant_core::{RevisionTag, INDEX_KEY};
use foliant_storage::{
    MemoryBackend, Object, ObjectMeta, ObjectStore, PutOptions, StorageError, StorageResult,
};

/// Fails every write of the index object with an I/O error; everything else
/// passes through. Simulates the index object being unreachable while page
/// objects still write fine.
pub struct BrokenIndexStore {
    inner: MemoryBackend,
}

impl BrokenIndexStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
        }
    }
}

#[async_trait]
impl ObjectStore for BrokenIndexStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        self.inner.head(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Object> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<RevisionTag> {
        if key == INDEX_KEY {
            return Err(StorageError::Io(std::io::Error::other(
                "index object unreachable",
            )));
        }
        self.inner.put(key, data, opts).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list(prefix).await
    }

    fn backend_name(&self) -> &'static str {
        "broken-index"
    }
}

/// Rejects every conditional write of the index object as a lost race,
/// as if another writer always lands first.
pub struct ContestedIndexStore {
    inner: MemoryBackend,
}

impl ContestedIndexStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
        }
    }
}

#[async_trait]
impl ObjectStore for ContestedIndexStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        self.inner.head(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Object> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<RevisionTag> {
        if key == INDEX_KEY {
            return Err(StorageError::PreconditionFailed(format!(
                "{key}: contested"
            )));
        }
        self.inner.put(key, data, opts).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list(prefix).await
    }

    fn backend_name(&self) -> &'static str {
        "contested-index"
    }
}
