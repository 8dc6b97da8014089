//! Object storage abstraction and backends for Foliant.
//!
//! This crate provides:
//! - A revision-tagged object store trait with conditional writes
//! - Backends: S3-compatible, local filesystem, and in-memory
//! - Content-hash revision tags for the local backends
//!
//! Conditional writes are the system's only serialization point. Every
//! backend reports a rejected precondition as
//! [`StorageError::PreconditionFailed`], so callers can treat a lost race
//! identically regardless of where the bucket lives.

pub mod backends;
pub mod config;
pub mod error;
pub mod traits;

pub use backends::{filesystem::FilesystemBackend, memory::MemoryBackend, s3::S3Backend};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use traits::{Object, ObjectMeta, ObjectStore, PutCondition, PutOptions};

use foliant_core::RevisionTag;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Compute the revision tag for object content.
///
/// The local backends derive tags from content alone, so a tag read back
/// after a write always matches a tag computed from the same bytes.
pub fn content_revision(data: &[u8]) -> RevisionTag {
    let mut hasher = Sha256::new();
    hasher.update(data);
    RevisionTag::new(hex::encode(hasher.finalize()))
}

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
        } => {
            let backend = S3Backend::new(
                bucket,
                endpoint.clone(),
                region.clone(),
                prefix.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
                *force_path_style,
            )
            .await?;
            Ok(Arc::new(backend))
        }
        StorageConfig::Memory => Ok(Arc::new(MemoryBackend::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;

    #[test]
    fn content_revision_is_deterministic() {
        let a = content_revision(b"wiki page body");
        let b = content_revision(b"wiki page body");
        assert_eq!(a, b);
        assert_ne!(a, content_revision(b"different body"));
        // hex sha-256
        assert_eq!(a.as_str().len(), 64);
    }

    #[tokio::test]
    async fn from_config_filesystem_ok() {
        let temp = tempdir().unwrap();
        let config = StorageConfig::Filesystem {
            path: temp.path().join("store"),
        };

        let store = from_config(&config).await.unwrap();
        store
            .put("hello.txt", Bytes::from_static(b"hi"), PutOptions::overwrite())
            .await
            .unwrap();
        assert!(store.exists("hello.txt").await.unwrap());
    }

    #[tokio::test]
    async fn from_config_s3_ok() {
        let config = StorageConfig::S3 {
            bucket: "bucket".to_string(),
            endpoint: Some("minio:9000".to_string()),
            region: Some("us-east-1".to_string()),
            prefix: Some("wiki".to_string()),
            access_key_id: None,
            secret_access_key: None,
            force_path_style: true,
        };

        let store = from_config(&config).await.unwrap();
        drop(store);
    }

    #[tokio::test]
    async fn from_config_memory_ok() {
        let store = from_config(&StorageConfig::Memory).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn from_config_rejects_partial_credentials() {
        let config = StorageConfig::S3 {
            bucket: "bucket".to_string(),
            endpoint: None,
            region: None,
            prefix: None,
            access_key_id: Some("access".to_string()),
            secret_access_key: None,
            force_path_style: false,
        };

        match from_config(&config).await {
            Ok(_) => panic!("expected error"),
            Err(StorageError::Config(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
}
