//! Object-store key layout and path validation.
//!
//! All wiki state lives in one bucket under fixed prefixes:
//! - page content under `pages/`, one object per page, `.md` suffix
//! - attachments under `files/`, one object per upload
//! - the wiki configuration at a single fixed key
//! - the denormalized page index at a single fixed key

use crate::error::{Error, Result};

/// Prefix for page content objects.
pub const PAGE_PREFIX: &str = "pages/";

/// Required suffix for page paths.
pub const PAGE_SUFFIX: &str = ".md";

/// Prefix for attachment objects.
pub const FILE_PREFIX: &str = "files/";

/// Key of the single wiki configuration object.
pub const CONFIG_KEY: &str = "wiki/config.json";

/// Key of the single page-index object.
pub const INDEX_KEY: &str = "wiki/pages.json";

/// Validate a page path.
///
/// Page paths are relative, slash-separated, traversal-free, and must end in
/// the page suffix (e.g. `guides/setup.md`). Validation runs before any
/// network call so malformed paths fail fast.
pub fn validate_page_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidPagePath("empty path".to_string()));
    }
    if !path.ends_with(PAGE_SUFFIX) {
        return Err(Error::InvalidPagePath(format!(
            "{path}: must end with {PAGE_SUFFIX}"
        )));
    }
    if path.len() == PAGE_SUFFIX.len() {
        return Err(Error::InvalidPagePath(format!("{path}: empty page name")));
    }
    validate_segments(path).map_err(|reason| Error::InvalidPagePath(format!("{path}: {reason}")))
}

/// Validate an attachment file id.
///
/// File ids are single path segments (no separators) so they can never
/// escape the `files/` prefix.
pub fn validate_file_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidFileId("empty id".to_string()));
    }
    if id.contains('/') || id.contains('\\') {
        return Err(Error::InvalidFileId(format!(
            "{id}: must be a single path segment"
        )));
    }
    if id == "." || id == ".." || id.starts_with('.') {
        return Err(Error::InvalidFileId(format!("{id}: unsafe segment")));
    }
    Ok(())
}

/// The object-store key for a page path.
pub fn page_key(path: &str) -> String {
    format!("{PAGE_PREFIX}{path}")
}

/// The page path for an object-store key, if the key is under the page prefix.
pub fn page_path_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(PAGE_PREFIX)
        .filter(|p| p.ends_with(PAGE_SUFFIX))
}

/// The object-store key for a file id.
pub fn file_key(id: &str) -> String {
    format!("{FILE_PREFIX}{id}")
}

fn validate_segments(path: &str) -> std::result::Result<(), &'static str> {
    if path.starts_with('/') {
        return Err("absolute paths not allowed");
    }
    if path.contains('\\') {
        return Err("backslashes not allowed");
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err("empty path segment");
        }
        if segment == "." || segment == ".." {
            return Err("path traversal not allowed");
        }
        if segment.chars().any(|c| c.is_control()) {
            return Err("control characters not allowed");
        }
    }
    Ok(())
}
