//! Local filesystem storage backend.
//!
//! Revision tags are hex SHA-256 content hashes. The backend serializes
//! compare-and-swap through a per-store async mutex, so a conditional write
//! observes and replaces the stored state atomically — the local equivalent
//! of the remote store's conditional-write primitive.

use crate::error::{StorageError, StorageResult};
use crate::traits::{Object, ObjectMeta, ObjectStore, PutCondition, PutOptions};
use async_trait::async_trait;
use bytes::Bytes;
use foliant_core::RevisionTag;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::instrument;

/// Local filesystem object store.
pub struct FilesystemBackend {
    root: PathBuf,
    // Serializes read-compare-swap cycles. Contention is per-store rather
    // than per-key; acceptable for a single-client wiki workload.
    write_lock: Mutex<()>,
}

impl FilesystemBackend {
    /// Create a new filesystem backend rooted at the given directory.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Get the full path for a key, with path traversal protection.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path traversal not allowed: {key}"
            )));
        }
        for component in Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => {
                    return Err(StorageError::InvalidKey(format!(
                        "contains unsafe path component: {key}"
                    )));
                }
            }
        }
        Ok(self.root.join(key))
    }

    async fn read_current(&self, key: &str, path: &Path) -> StorageResult<Option<Bytes>> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {key}: {e}"),
            ))),
        }
    }

    /// Write data atomically: temp file in the same directory, then rename.
    async fn write_atomic(&self, path: &Path, data: &Bytes) -> StorageResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey("key has no parent".to_string()))?;
        fs::create_dir_all(parent).await?;

        let tmp = parent.join(format!(
            ".tmp-{}-{}",
            std::process::id(),
            time::OffsetDateTime::now_utc().unix_timestamp_nanos()
        ));
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::Io(e));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_path(key)?;
        fs::try_exists(&path).await.map_err(StorageError::Io)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let path = self.key_path(key)?;
        let metadata = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(ObjectMeta {
            size: metadata.len(),
            last_modified: metadata.modified().ok().map(|t| t.into()),
            // The filesystem has nowhere to keep a content type.
            content_type: None,
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, key: &str) -> StorageResult<Object> {
        let path = self.key_path(key)?;
        let data = self
            .read_current(key, &path)
            .await?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        let meta = self.head(key).await?;
        let revision = crate::content_revision(&data);
        Ok(Object {
            data,
            revision,
            meta,
        })
    }

    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<RevisionTag> {
        let path = self.key_path(key)?;

        let _guard = self.write_lock.lock().await;

        let current = self.read_current(key, &path).await?;
        match (&opts.condition, &current) {
            (PutCondition::IfAbsent, Some(_)) => {
                return Err(StorageError::PreconditionFailed(format!(
                    "{key}: object already exists"
                )));
            }
            (PutCondition::IfMatch(expected), Some(bytes)) => {
                let stored = crate::content_revision(bytes);
                if stored != *expected {
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

        self.write_atomic(&path, &data).await?;
        Ok(crate::content_revision(&data))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        let _guard = self.write_lock.lock().await;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut results = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    let Ok(relative) = path.strip_prefix(&self.root) else {
                        continue;
                    };
                    let key = relative.to_string_lossy().replace('\\', "/");
                    // Skip temp files from interrupted writes.
                    if key.starts_with(".tmp-") || key.contains("/.tmp-") {
                        continue;
                    }
                    if key.starts_with(prefix) {
                        results.push(key);
                    }
                }
            }
        }

        results.sort();
        Ok(results)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
