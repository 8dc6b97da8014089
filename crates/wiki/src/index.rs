//! The metadata index manager.
//!
//! All mutations of the single index object go through a bounded
//! read-modify-write loop: read the index and its revision tag, mutate in
//! memory, write back conditionally. Losing the conditional write means
//! another writer landed in between; the whole cycle retries against the
//! fresh state. Operations are idempotent upserts, so a retry converges.

use crate::error::{WikiError, WikiResult};
use bytes::Bytes;
use foliant_core::{MetadataIndex, MetadataOperation, RevisionTag, WikiPageMeta, INDEX_KEY};
use foliant_storage::{ObjectStore, PutOptions, StorageError};
use std::sync::Arc;

/// Attempts before an index update is reported as lost.
///
/// Retries are immediate: the conflict window is one small-object write, so
/// backoff buys nothing.
const MAX_ATTEMPTS: u32 = 3;

/// Owner of the page-index object.
pub struct PageIndexManager {
    store: Arc<dyn ObjectStore>,
}

impl PageIndexManager {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Read the current index. An absent index object reads as empty.
    pub async fn load(&self) -> WikiResult<MetadataIndex> {
        Ok(self.load_with_tag().await?.0)
    }

    /// Index entries in path order, optionally filtered by path prefix.
    pub async fn entries(&self, prefix: Option<&str>) -> WikiResult<Vec<WikiPageMeta>> {
        Ok(self.load().await?.entries(prefix))
    }

    /// Apply one mutation under the retry loop.
    pub async fn apply(&self, op: &MetadataOperation) -> WikiResult<()> {
        self.write_with_retry(|index| index.apply(op)).await
    }

    /// Replace the whole index with the given entries. Used by the reindex
    /// repair path; runs under the same retry loop as `apply`.
    pub async fn rebuild(&self, entries: Vec<WikiPageMeta>) -> WikiResult<()> {
        let pages: std::collections::BTreeMap<String, WikiPageMeta> = entries
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();
        self.write_with_retry(|index| index.pages = pages.clone())
            .await
    }

    async fn load_with_tag(&self) -> WikiResult<(MetadataIndex, Option<RevisionTag>)> {
        match self.store.get(INDEX_KEY).await {
            Ok(object) => {
                let index: MetadataIndex = serde_json::from_slice(&object.data)?;
                Ok((index, Some(object.revision)))
            }
            Err(StorageError::NotFound(_)) => Ok((MetadataIndex::default(), None)),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_with_retry(&self, mutate: impl Fn(&mut MetadataIndex)) -> WikiResult<()> {
        for attempt in 1..=MAX_ATTEMPTS {
            let (mut index, tag) = self.load_with_tag().await?;
            mutate(&mut index);
            let data = serde_json::to_vec(&index)?;

            // An absent index must be created conditionally too, or two
            // first-writers would silently overwrite each other.
            let opts = match tag {
                Some(tag) => PutOptions::if_match(tag),
                None => PutOptions::if_absent(),
            }
            .with_content_type("application/json");

            match self.store.put(INDEX_KEY, Bytes::from(data), opts).await {
                Ok(_) => return Ok(()),
                Err(StorageError::PreconditionFailed(_)) => {
                    tracing::debug!(attempt, "index write lost a race, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(
            attempts = MAX_ATTEMPTS,
            "metadata index update exhausted retries"
        );
        Err(WikiError::MetadataUpdateConflict {
            attempts: MAX_ATTEMPTS,
        })
    }
}
