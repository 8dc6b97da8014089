//! Wiki configuration manager.
//!
//! The configuration object is loaded once and cached for the session
//! together with the revision tag observed at the load. Saves are
//! conditional on that tag, so two admins editing settings concurrently
//! produce a [`WikiError::ConfigConflict`] instead of a silent clobber.

use crate::error::{WikiError, WikiResult};
use bytes::Bytes;
use foliant_core::{RevisionTag, WikiConfig, CONFIG_KEY};
use foliant_storage::{ObjectStore, PutOptions, StorageError};
use std::sync::Arc;
use tokio::sync::RwLock;

struct CachedConfig {
    config: WikiConfig,
    /// Tag of the stored object, or `None` when running on defaults because
    /// no config object exists yet.
    revision: Option<RevisionTag>,
}

/// Session-scoped owner of the wiki configuration object.
pub struct ConfigManager {
    store: Arc<dyn ObjectStore>,
    cached: RwLock<Option<CachedConfig>>,
}

impl ConfigManager {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    /// The current configuration, loading and caching it on first call.
    ///
    /// An absent config object yields the defaults; nothing is written until
    /// an admin explicitly saves.
    pub async fn load(&self) -> WikiResult<WikiConfig> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            return Ok(cached.config.clone());
        }

        let mut guard = self.cached.write().await;
        // Another loader may have filled the cache while we waited.
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.config.clone());
        }

        let cached = match self.store.get(CONFIG_KEY).await {
            Ok(object) => CachedConfig {
                config: serde_json::from_slice(&object.data)?,
                revision: Some(object.revision),
            },
            Err(StorageError::NotFound(_)) => CachedConfig {
                config: WikiConfig::default(),
                revision: None,
            },
            Err(e) => return Err(e.into()),
        };
        let config = cached.config.clone();
        *guard = Some(cached);
        Ok(config)
    }

    /// Save a new configuration, conditional on the cached revision.
    ///
    /// On conflict the stale cache is dropped, so the next `load` observes
    /// the winning configuration.
    pub async fn save(&self, config: WikiConfig) -> WikiResult<()> {
        config.validate().map_err(WikiError::Config)?;
        // Ensure the cache (and its tag) reflects a real load.
        self.load().await?;

        let mut guard = self.cached.write().await;
        let expected = guard.as_ref().and_then(|c| c.revision.clone());
        let opts = match expected {
            Some(tag) => PutOptions::if_match(tag),
            None => PutOptions::if_absent(),
        }
        .with_content_type("application/json");

        let data = serde_json::to_vec(&config)?;
        match self.store.put(CONFIG_KEY, Bytes::from(data), opts).await {
            Ok(revision) => {
                *guard = Some(CachedConfig {
                    config,
                    revision: Some(revision),
                });
                Ok(())
            }
            Err(StorageError::PreconditionFailed(_)) => {
                *guard = None;
                Err(WikiError::ConfigConflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the cache and re-read from the store.
    pub async fn reload(&self) -> WikiResult<WikiConfig> {
        *self.cached.write().await = None;
        self.load().await
    }
}
