//! Attachment repository.
//!
//! Files are write-once objects under the `files/` prefix; the id embeds
//! the original filename stem and a nanosecond upload timestamp. There is
//! no reference tracking: whether a page uses a file is decided by scanning
//! page content for the id, which errs on the side of keeping files.

use crate::config::ConfigManager;
use crate::error::{WikiError, WikiResult};
use crate::index::PageIndexManager;
use bytes::Bytes;
use foliant_core::{file, keys, FileInfo, FileUpload, PageDocument, FILE_PREFIX};
use foliant_storage::{ObjectStore, PutOptions, StorageError};
use std::collections::HashSet;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::instrument;

/// Repository for uploaded attachments.
pub struct FileRepository {
    store: Arc<dyn ObjectStore>,
    index: Arc<PageIndexManager>,
    config: Arc<ConfigManager>,
}

impl FileRepository {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        index: Arc<PageIndexManager>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Upload an attachment.
    ///
    /// Size, file type, and the per-page attachment quota are all checked
    /// before any byte leaves the process.
    #[instrument(skip(self, upload), fields(filename = %upload.filename, size = upload.data.len()))]
    pub async fn upload_file(&self, upload: FileUpload) -> WikiResult<FileInfo> {
        let limits = self.config.load().await?.limits;

        let size = upload.data.len() as u64;
        if size > limits.max_file_size {
            return Err(WikiError::FileTooLarge {
                size,
                limit: limits.max_file_size,
            });
        }

        let (_stem, ext) = file::split_filename(&upload.filename)?;
        if !file::is_allowed_extension(&ext) {
            return Err(WikiError::InvalidFileType(ext));
        }

        if let Some(page_path) = &upload.page_path {
            let referenced = self.files_referenced_by(page_path).await?;
            if referenced >= limits.max_files_per_page {
                return Err(WikiError::FileQuotaReached {
                    page: page_path.clone(),
                    limit: limits.max_files_per_page,
                });
            }
        }

        let uploaded_at = OffsetDateTime::now_utc();
        let id = file::file_id_for(&upload.filename, uploaded_at)?;
        let content_type = upload
            .content_type
            .clone()
            .unwrap_or_else(|| file::content_type_for(&upload.filename).to_string());

        let key = keys::file_key(&id);
        self.store
            .put(
                &key,
                upload.data,
                PutOptions::if_absent().with_content_type(&content_type),
            )
            .await?;

        Ok(FileInfo {
            id,
            filename: upload.filename,
            size,
            content_type,
            uploaded_at,
            url: key,
        })
    }

    /// Fetch an attachment's descriptor and content.
    pub async fn get_file(&self, id: &str) -> WikiResult<(FileInfo, Bytes)> {
        keys::validate_file_id(id)?;
        let key = keys::file_key(id);
        let object = self.store.get(&key).await.map_err(|e| match e {
            StorageError::NotFound(_) => WikiError::FileNotFound(id.to_string()),
            other => other.into(),
        })?;
        let info = file_info(id, object.meta.size, object.meta.content_type.clone(), object.meta.last_modified);
        Ok((info, object.data))
    }

    /// Delete an attachment.
    pub async fn delete_file(&self, id: &str) -> WikiResult<()> {
        keys::validate_file_id(id)?;
        let key = keys::file_key(id);
        self.store.delete(&key).await.map_err(|e| match e {
            StorageError::NotFound(_) => WikiError::FileNotFound(id.to_string()),
            other => other.into(),
        })
    }

    /// All attachments, in id order.
    pub async fn list_files(&self) -> WikiResult<Vec<FileInfo>> {
        let keys = self.store.list(FILE_PREFIX).await?;
        let mut files = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(id) = key.strip_prefix(FILE_PREFIX) else {
                continue;
            };
            let meta = self.store.head(&key).await?;
            files.push(file_info(id, meta.size, meta.content_type, meta.last_modified));
        }
        Ok(files)
    }

    /// Attachments no longer referenced by any page once `deleted_page_path`
    /// is gone.
    ///
    /// A file counts as referenced if its id occurs anywhere in a remaining
    /// page's content. Plain substring matching is deliberate: a false
    /// "still referenced" keeps a dead file around, a false orphan would
    /// delete a live one.
    #[instrument(skip(self))]
    pub async fn find_orphaned_files(&self, deleted_page_path: &str) -> WikiResult<Vec<FileInfo>> {
        let files = self.list_files().await?;
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut referenced: HashSet<&str> = HashSet::new();
        for entry in self.index.entries(None).await? {
            if entry.path == deleted_page_path {
                continue;
            }
            let Some(content) = self.page_content(&entry.path).await? else {
                continue;
            };
            for info in &files {
                if content.contains(&info.id) {
                    referenced.insert(info.id.as_str());
                }
            }
        }

        Ok(files
            .iter()
            .filter(|info| !referenced.contains(info.id.as_str()))
            .cloned()
            .collect())
    }

    /// Delete the given attachments, returning the ids that could NOT be
    /// deleted. Already-absent ids count as deleted.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_orphaned_files(&self, ids: &[String]) -> WikiResult<Vec<String>> {
        let deletions = ids.iter().map(|id| async move {
            if keys::validate_file_id(id).is_err() {
                return Some(id.clone());
            }
            match self.store.delete(&keys::file_key(id)).await {
                Ok(()) | Err(StorageError::NotFound(_)) => None,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "orphan deletion failed");
                    Some(id.clone())
                }
            }
        });
        let failed: Vec<String> = futures::future::join_all(deletions)
            .await
            .into_iter()
            .flatten()
            .collect();
        if !failed.is_empty() {
            tracing::warn!(failed = failed.len(), "partial orphan deletion");
        }
        Ok(failed)
    }

    /// Number of attachments referenced by the given page's content.
    async fn files_referenced_by(&self, page_path: &str) -> WikiResult<usize> {
        let Some(content) = self.page_content(page_path).await? else {
            // Attaching to a not-yet-saved page: nothing referenced yet.
            return Ok(0);
        };
        let file_keys = self.store.list(FILE_PREFIX).await?;
        Ok(file_keys
            .iter()
            .filter_map(|key| key.strip_prefix(FILE_PREFIX))
            .filter(|id| content.contains(id))
            .count())
    }

    /// A page's content for reference scanning, or `None` if the page
    /// object is absent. An unparsable object is scanned as raw text so a
    /// reference inside it still counts.
    async fn page_content(&self, path: &str) -> WikiResult<Option<String>> {
        let key = keys::page_key(path);
        let object = match self.store.get(&key).await {
            Ok(object) => object,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<PageDocument>(&object.data) {
            Ok(doc) => Ok(Some(doc.content)),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "unparsable page object, scanning raw bytes");
                Ok(Some(String::from_utf8_lossy(&object.data).into_owned()))
            }
        }
    }
}

fn file_info(
    id: &str,
    size: u64,
    content_type: Option<String>,
    last_modified: Option<OffsetDateTime>,
) -> FileInfo {
    let uploaded_at = file::uploaded_at_from_id(id)
        .or(last_modified)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    FileInfo {
        filename: file::filename_from_id(id).unwrap_or_else(|| id.to_string()),
        content_type: content_type.unwrap_or_else(|| file::content_type_for(id).to_string()),
        size,
        uploaded_at,
        url: keys::file_key(id),
        id: id.to_string(),
    }
}
