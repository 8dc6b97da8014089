//! Repositories, metadata index, and session layer for the foliant wiki.
//!
//! The [`Wiki`] facade bundles the object store, the page and file
//! repositories, the config manager, and the session manager, and checks
//! permissions for the acting principal before every operation. Embedding
//! applications that want to compose differently can use the repositories
//! directly.

pub mod auth;
pub mod config;
pub mod error;
pub mod files;
pub mod hierarchy;
pub mod index;
pub mod pages;

pub use auth::{AuthSession, IdentityProvider, SessionManager};
pub use config::ConfigManager;
pub use error::{WikiError, WikiResult};
pub use files::FileRepository;
pub use hierarchy::PageNode;
pub use index::PageIndexManager;
pub use pages::{PageDeletion, PageRepository, SaveOutcome};

use bytes::Bytes;
use foliant_core::{
    check_permission, Action, FileInfo, FileUpload, Page, PageDraft, Principal, RevisionTag,
    SessionToken, WikiConfig, WikiPageMeta,
};
use foliant_storage::{ObjectStore, StorageConfig};
use std::sync::Arc;

/// The assembled wiki: storage, repositories, configuration, and session.
///
/// Every operation authorizes the acting principal first; a refusal is
/// [`WikiError::PermissionDenied`] and nothing touches the store.
pub struct Wiki {
    config: Arc<ConfigManager>,
    pages: PageRepository,
    files: Arc<FileRepository>,
    session: SessionManager,
}

impl Wiki {
    /// Assemble a wiki over an existing store.
    pub fn new(store: Arc<dyn ObjectStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        let config = Arc::new(ConfigManager::new(Arc::clone(&store)));
        let index = Arc::new(PageIndexManager::new(Arc::clone(&store)));
        let files = Arc::new(FileRepository::new(
            Arc::clone(&store),
            Arc::clone(&index),
            Arc::clone(&config),
        ));
        let pages = PageRepository::new(
            store,
            index,
            Arc::clone(&files),
            Arc::clone(&config),
        );
        Self {
            config,
            pages,
            files,
            session: SessionManager::new(provider),
        }
    }

    /// Assemble a wiki from storage configuration.
    pub async fn open(
        storage: &StorageConfig,
        provider: Arc<dyn IdentityProvider>,
    ) -> WikiResult<Self> {
        let store = foliant_storage::from_config(storage).await?;
        Ok(Self::new(store, provider))
    }

    // --- pages ---

    pub async fn get_page(&self, path: &str) -> WikiResult<Page> {
        self.authorize(Action::Read).await?;
        self.pages.get_page(path).await
    }

    pub async fn save_page(
        &self,
        draft: PageDraft,
        expected: Option<&RevisionTag>,
    ) -> WikiResult<SaveOutcome> {
        self.authorize(Action::Write).await?;
        self.pages.save_page(draft, expected).await
    }

    pub async fn delete_page(&self, path: &str) -> WikiResult<PageDeletion> {
        self.authorize(Action::Delete).await?;
        self.pages.delete_page(path).await
    }

    pub async fn list_pages(&self, prefix: Option<&str>) -> WikiResult<Vec<WikiPageMeta>> {
        self.authorize(Action::Read).await?;
        self.pages.list_pages(prefix).await
    }

    pub async fn page_hierarchy(&self) -> WikiResult<Vec<PageNode>> {
        self.authorize(Action::Read).await?;
        self.pages.page_hierarchy().await
    }

    /// Rebuild the page index from the authoritative page objects.
    pub async fn rebuild_index(&self) -> WikiResult<usize> {
        self.authorize(Action::Admin).await?;
        self.pages.rebuild_index().await
    }

    // --- files ---

    pub async fn upload_file(&self, upload: FileUpload) -> WikiResult<FileInfo> {
        self.authorize(Action::Upload).await?;
        self.files.upload_file(upload).await
    }

    pub async fn get_file(&self, id: &str) -> WikiResult<(FileInfo, Bytes)> {
        self.authorize(Action::Read).await?;
        self.files.get_file(id).await
    }

    pub async fn delete_file(&self, id: &str) -> WikiResult<()> {
        self.authorize(Action::Delete).await?;
        self.files.delete_file(id).await
    }

    pub async fn list_files(&self) -> WikiResult<Vec<FileInfo>> {
        self.authorize(Action::Read).await?;
        self.files.list_files().await
    }

    pub async fn find_orphaned_files(&self, deleted_page_path: &str) -> WikiResult<Vec<FileInfo>> {
        self.authorize(Action::Read).await?;
        self.files.find_orphaned_files(deleted_page_path).await
    }

    /// Delete confirmed orphans; returns the ids that could not be deleted.
    pub async fn delete_orphaned_files(&self, ids: &[String]) -> WikiResult<Vec<String>> {
        self.authorize(Action::Delete).await?;
        self.files.delete_orphaned_files(ids).await
    }

    // --- auth ---

    pub async fn login(&self, username: &str, password: &str) -> WikiResult<Principal> {
        self.session.login(username, password).await
    }

    pub async fn resume(&self, token: &SessionToken) -> WikiResult<Principal> {
        self.session.resume(token).await
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    pub async fn current_user(&self) -> Option<Principal> {
        self.session.current_user().await
    }

    pub async fn refresh_session(&self) -> WikiResult<()> {
        self.session.refresh_session().await
    }

    /// The current session token, for persisting across restarts.
    pub async fn session_token(&self) -> Option<SessionToken> {
        self.session.current_token().await
    }

    // --- admin ---

    /// The active configuration (cached after the first load).
    pub async fn config(&self) -> WikiResult<WikiConfig> {
        self.config.load().await
    }

    /// Save the configuration; conflicts with a concurrent admin save
    /// surface as [`WikiError::ConfigConflict`].
    pub async fn save_config(&self, config: WikiConfig) -> WikiResult<()> {
        self.authorize(Action::Admin).await?;
        self.config.save(config).await
    }

    async fn authorize(&self, action: Action) -> WikiResult<()> {
        let principal = self.session.current_user().await;
        let config = self.config.load().await?;
        if check_permission(principal.as_ref(), action, &config) {
            Ok(())
        } else {
            Err(WikiError::PermissionDenied { action })
        }
    }
}
