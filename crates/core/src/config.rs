//! Wiki configuration, stored as a single JSON object in the bucket.

use serde::{Deserialize, Serialize};

/// Process-wide wiki configuration.
///
/// Loaded once per session from the fixed config key, cached by the config
/// manager, and re-saved explicitly by an admin action. Every field has a
/// serde default so a partially written config object still loads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WikiConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// When true, unauthenticated visitors may read pages.
    #[serde(default)]
    pub allow_guest_access: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub features: WikiFeatures,
    #[serde(default)]
    pub limits: WikiLimits,
}

/// Feature toggles.
///
/// Advisory data for the embedding UI (hide the upload button, hide search,
/// and so on). The repositories do not gate on these: the hard limits in
/// [`WikiLimits`] are what the library enforces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiFeatures {
    #[serde(default = "default_true")]
    pub attachments: bool,
    #[serde(default = "default_true")]
    pub page_history_hints: bool,
    #[serde(default = "default_true")]
    pub search: bool,
}

/// Hard limits enforced before any network call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiLimits {
    /// Maximum attachment size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum number of pages in the wiki.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Maximum number of attachments referenced by a single page.
    #[serde(default = "default_max_files_per_page")]
    pub max_files_per_page: usize,
}

fn default_title() -> String {
    "Wiki".to_string()
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_max_pages() -> usize {
    10_000
}

fn default_max_files_per_page() -> usize {
    20
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            allow_guest_access: false,
            theme: default_theme(),
            features: WikiFeatures::default(),
            limits: WikiLimits::default(),
        }
    }
}

impl Default for WikiFeatures {
    fn default() -> Self {
        Self {
            attachments: true,
            page_history_hints: true,
            search: true,
        }
    }
}

impl Default for WikiLimits {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_pages: default_max_pages(),
            max_files_per_page: default_max_files_per_page(),
        }
    }
}

impl WikiConfig {
    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.limits.max_file_size == 0 {
            return Err("limits.max_file_size must be positive".to_string());
        }
        if self.limits.max_pages == 0 {
            return Err("limits.max_pages must be positive".to_string());
        }
        if self.limits.max_files_per_page == 0 {
            return Err("limits.max_files_per_page must be positive".to_string());
        }
        Ok(())
    }
}
