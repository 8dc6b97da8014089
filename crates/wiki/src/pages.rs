//! Page repository: the optimistic-concurrency save protocol.
//!
//! Page objects are authoritative; the index is a derived cache. A save is
//! one conditional write keyed on the revision tag the editor loaded, so
//! the store itself serializes concurrent edits of the same page. A lost
//! race comes back as [`SaveOutcome::Conflict`] with the winner's current
//! state — never an automatic retry, because merging is an editorial
//! decision.

use crate::error::{WikiError, WikiResult};
use crate::files::FileRepository;
use crate::hierarchy::{build_hierarchy, PageNode};
use crate::index::PageIndexManager;
use bytes::Bytes;
use foliant_core::{
    keys, FileInfo, MetadataOperation, Page, PageDocument, PageDraft, PageMetadata, RevisionTag,
    WikiPageMeta, PAGE_PREFIX,
};
use foliant_storage::{ObjectStore, PutOptions, StorageError};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::instrument;

/// Result of a page save.
#[derive(Clone, Debug)]
pub enum SaveOutcome {
    /// The conditional write landed.
    Saved {
        /// The page as now stored, carrying the new revision tag.
        page: Page,
        /// False when the page wrote but the index update did not; the
        /// page is safe and a reindex reconciles the listing.
        index_synced: bool,
    },
    /// Someone else changed the page since the caller loaded it.
    Conflict {
        /// The page as currently stored, for merging.
        current: Page,
    },
}

/// Result of a page deletion.
#[derive(Clone, Debug)]
pub struct PageDeletion {
    /// Path of the deleted page.
    pub path: String,
    /// Attachments no longer referenced by any remaining page. The
    /// deletion never removes them; callers confirm and call
    /// [`FileRepository::delete_orphaned_files`].
    pub orphaned_files: Vec<FileInfo>,
    /// True iff orphans exist.
    pub confirmation_required: bool,
}

/// Repository for page objects.
pub struct PageRepository {
    store: Arc<dyn ObjectStore>,
    index: Arc<PageIndexManager>,
    files: Arc<FileRepository>,
    config: Arc<crate::config::ConfigManager>,
}

impl PageRepository {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        index: Arc<PageIndexManager>,
        files: Arc<FileRepository>,
        config: Arc<crate::config::ConfigManager>,
    ) -> Self {
        Self {
            store,
            index,
            files,
            config,
        }
    }

    /// Fetch a page together with its current revision tag.
    pub async fn get_page(&self, path: &str) -> WikiResult<Page> {
        keys::validate_page_path(path)?;
        self.fetch(path).await
    }

    /// Save a page.
    ///
    /// `expected` is the revision tag the editor loaded; `None` means the
    /// page is brand new and must not exist yet. Exactly one conditional
    /// write decides the outcome.
    #[instrument(skip(self, draft), fields(path = %draft.path))]
    pub async fn save_page(
        &self,
        draft: PageDraft,
        expected: Option<&RevisionTag>,
    ) -> WikiResult<SaveOutcome> {
        keys::validate_page_path(&draft.path)?;
        let now = OffsetDateTime::now_utc();

        let (metadata, opts, is_new) = match expected {
            None => {
                let limits = self.config.load().await?.limits;
                let index = self.index.load().await?;
                if index.len() >= limits.max_pages && !index.pages.contains_key(&draft.path) {
                    return Err(WikiError::PageLimitReached {
                        limit: limits.max_pages,
                    });
                }
                let metadata = PageMetadata {
                    created_at: now,
                    updated_at: now,
                    author: draft.author.clone(),
                    version: 1,
                    tags: draft.tags.clone(),
                };
                (metadata, PutOptions::if_absent(), true)
            }
            Some(tag) => {
                let current = self.fetch(&draft.path).await?;
                if current.revision != *tag {
                    // Already stale; skip the doomed write.
                    return Ok(SaveOutcome::Conflict { current });
                }
                let metadata = PageMetadata {
                    created_at: current.metadata.created_at,
                    updated_at: now,
                    author: draft.author.clone(),
                    version: current.metadata.version + 1,
                    tags: draft.tags.clone(),
                };
                (metadata, PutOptions::if_match(tag.clone()), false)
            }
        };

        let doc = PageDocument {
            title: draft.title,
            content: draft.content,
            metadata,
        };
        let data = serde_json::to_vec(&doc)?;
        let key = keys::page_key(&draft.path);

        let revision = match self
            .store
            .put(&key, Bytes::from(data), opts.with_content_type("application/json"))
            .await
        {
            Ok(revision) => revision,
            Err(StorageError::PreconditionFailed(_)) => {
                let current = self.fetch(&draft.path).await?;
                return Ok(SaveOutcome::Conflict { current });
            }
            Err(e) => return Err(e.into()),
        };

        let page = Page::from_document(draft.path, doc, revision);
        let op = if is_new {
            MetadataOperation::Add(page.index_entry())
        } else {
            MetadataOperation::Update(page.index_entry())
        };

        // The page write is never rolled back over an index failure: the
        // page is authoritative and a reindex repairs the listing.
        let index_synced = match self.index.apply(&op).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %page.path, error = %e, "index update failed after page save");
                false
            }
        };

        Ok(SaveOutcome::Saved { page, index_synced })
    }

    /// Delete a page and report which attachments that leaves orphaned.
    #[instrument(skip(self))]
    pub async fn delete_page(&self, path: &str) -> WikiResult<PageDeletion> {
        keys::validate_page_path(path)?;
        let key = keys::page_key(path);
        self.store.delete(&key).await.map_err(|e| match e {
            StorageError::NotFound(_) => WikiError::PageNotFound(path.to_string()),
            other => other.into(),
        })?;

        let orphaned_files = self.files.find_orphaned_files(path).await?;
        self.index
            .apply(&MetadataOperation::Delete {
                path: path.to_string(),
            })
            .await?;

        Ok(PageDeletion {
            path: path.to_string(),
            confirmation_required: !orphaned_files.is_empty(),
            orphaned_files,
        })
    }

    /// List pages from the index, optionally under a path prefix.
    ///
    /// Always served from the index object; never a live store scan.
    pub async fn list_pages(&self, prefix: Option<&str>) -> WikiResult<Vec<WikiPageMeta>> {
        self.index.entries(prefix).await
    }

    /// The page tree derived from the index.
    pub async fn page_hierarchy(&self) -> WikiResult<Vec<PageNode>> {
        Ok(build_hierarchy(self.index.entries(None).await?))
    }

    /// Rebuild the index from the authoritative page objects.
    ///
    /// Returns the number of pages indexed. Unparsable page objects are
    /// skipped with a warning rather than failing the rebuild.
    #[instrument(skip(self))]
    pub async fn rebuild_index(&self) -> WikiResult<usize> {
        let page_keys = self.store.list(PAGE_PREFIX).await?;
        let mut entries = Vec::with_capacity(page_keys.len());
        for key in page_keys {
            let Some(path) = keys::page_path_from_key(&key) else {
                continue;
            };
            let object = match self.store.get(&key).await {
                Ok(object) => object,
                // Deleted between list and get; not an index entry.
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_slice::<PageDocument>(&object.data) {
                Ok(doc) => {
                    entries.push(Page::from_document(path, doc, object.revision).index_entry());
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping unparsable page object");
                }
            }
        }

        let count = entries.len();
        self.index.rebuild(entries).await?;
        tracing::debug!(pages = count, "index rebuilt");
        Ok(count)
    }

    async fn fetch(&self, path: &str) -> WikiResult<Page> {
        let key = keys::page_key(path);
        let object = self.store.get(&key).await.map_err(|e| match e {
            StorageError::NotFound(_) => WikiError::PageNotFound(path.to_string()),
            other => other.into(),
        })?;
        let doc: PageDocument = serde_json::from_slice(&object.data)?;
        Ok(Page::from_document(path, doc, object.revision))
    }
}
