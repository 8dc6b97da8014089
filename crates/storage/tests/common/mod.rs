//! Shared helpers for storage integration tests.

use foliant_storage::{FilesystemBackend, MemoryBackend, ObjectStore};
use std::sync::Arc;
use tempfile::TempDir;

/// All local backends under test. The `TempDir` guard keeps filesystem
/// state alive for the duration of the test.
pub async fn local_backends() -> Vec<(Arc<dyn ObjectStore>, Option<TempDir>)> {
    let temp = tempfile::tempdir().expect("tempdir");
    let filesystem = FilesystemBackend::new(temp.path())
        .await
        .expect("filesystem backend");

    vec![
        (Arc::new(MemoryBackend::new()) as Arc<dyn ObjectStore>, None),
        (Arc::new(filesystem) as Arc<dyn ObjectStore>, Some(temp)),
    ]
}
