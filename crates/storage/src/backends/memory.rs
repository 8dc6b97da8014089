//! In-memory storage backend.
//!
//! Backs tests and embedded/demo use. Revision tags are content hashes, the
//! same scheme as the filesystem backend, so conditional-write behavior is
//! identical across local backends.

use crate::error::{StorageError, StorageResult};
use crate::traits::{Object, ObjectMeta, ObjectStore, PutCondition, PutOptions};
use async_trait::async_trait;
use bytes::Bytes;
use foliant_core::RevisionTag;
use std::collections::BTreeMap;
use std::sync::Mutex;
use time::OffsetDateTime;

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    revision: RevisionTag,
    content_type: Option<String>,
    last_modified: OffsetDateTime,
}

/// In-memory object store.
#[derive(Default)]
pub struct MemoryBackend {
    // BTreeMap keeps list() output sorted without a separate sort pass.
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects. Test helper.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("memory store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>> {
        // A poisoned mutex means a panic mid-mutation; propagating the panic
        // is the only sound option for test infrastructure.
        self.objects.lock().expect("memory store poisoned")
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.lock().contains_key(key))
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let objects = self.lock();
        let stored = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(ObjectMeta {
            size: stored.data.len() as u64,
            last_modified: Some(stored.last_modified),
            content_type: stored.content_type.clone(),
        })
    }

    async fn get(&self, key: &str) -> StorageResult<Object> {
        let objects = self.lock();
        let stored = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Object {
            data: stored.data.clone(),
            revision: stored.revision.clone(),
            meta: ObjectMeta {
                size: stored.data.len() as u64,
                last_modified: Some(stored.last_modified),
                content_type: stored.content_type.clone(),
            },
        })
    }

    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<RevisionTag> {
        let mut objects = self.lock();
        match (&opts.condition, objects.get(key)) {
            (PutCondition::IfAbsent, Some(_)) => {
                return Err(StorageError::PreconditionFailed(format!(
                    "{key}: object already exists"
                )));
            }
            (PutCondition::IfMatch(expected), Some(stored)) => {
                if stored.revision != *expected {
                    return Err(StorageError::PreconditionFailed(format!(
                        "{key}: revision tag mismatch"
                    )));
                }
            }
            (PutCondition::IfMatch(_), None) => {
                return Err(StorageError::PreconditionFailed(format!(
                    "{key}: object no longer exists"
                )));
            }
            _ => {}
        }

        let revision = crate::content_revision(&data);
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                revision: revision.clone(),
                content_type: opts.content_type,
                last_modified: OffsetDateTime::now_utc(),
            },
        );
        Ok(revision)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match self.lock().remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .lock()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
