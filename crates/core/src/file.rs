//! Attachment file descriptors and upload input.

use crate::error::{Error, Result};
use crate::keys;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Descriptor for an uploaded attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Unique id; embeds the original filename stem and a nanosecond
    /// timestamp for collision resistance.
    pub id: String,
    /// Original filename as uploaded.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    pub content_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    /// Access URL derived from the storage key.
    pub url: String,
}

/// Caller-supplied input for an attachment upload.
#[derive(Clone, Debug)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
    /// Page the file is being attached to, if any. Used to enforce the
    /// per-page attachment quota before the upload starts.
    pub page_path: Option<String>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data,
            page_path: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn for_page(mut self, page_path: impl Into<String>) -> Self {
        self.page_path = Some(page_path.into());
        self
    }
}

/// Extensions accepted for upload. Conservative allow-list; anything else is
/// rejected before any network call.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "pdf", "txt", "md", "csv", "json", "zip",
];

/// Split a filename into (stem, extension). The extension is lowercased.
pub fn split_filename(filename: &str) -> Result<(String, String)> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(Error::InvalidFilename("empty filename".to_string()));
    }
    if filename.contains('/') || filename.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "{filename}: must not contain path separators"
        )));
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            Ok((stem.to_string(), ext.to_ascii_lowercase()))
        }
        _ => Err(Error::InvalidFilename(format!(
            "{filename}: missing extension"
        ))),
    }
}

/// Whether the extension is on the upload allow-list.
pub fn is_allowed_extension(ext: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&ext)
}

/// Build a collision-resistant file id from a filename and an upload instant.
///
/// The stem is sanitized to a conservative character set; the nanosecond
/// timestamp makes simultaneous uploads of the same filename distinct.
pub fn file_id_for(filename: &str, uploaded_at: OffsetDateTime) -> Result<String> {
    let (stem, ext) = split_filename(filename)?;
    let safe_stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let id = format!("{safe_stem}-{}.{ext}", uploaded_at.unix_timestamp_nanos());
    keys::validate_file_id(&id)?;
    Ok(id)
}

/// Recover the original filename from a file id, if the id follows the
/// `stem-{nanos}.ext` convention.
pub fn filename_from_id(id: &str) -> Option<String> {
    let (stem_and_ts, ext) = id.rsplit_once('.')?;
    let (stem, ts) = stem_and_ts.rsplit_once('-')?;
    if stem.is_empty() || ts.is_empty() || !ts.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{stem}.{ext}"))
}

/// Upload instant encoded in a file id, if recoverable.
pub fn uploaded_at_from_id(id: &str) -> Option<OffsetDateTime> {
    let (stem_and_ts, _ext) = id.rsplit_once('.')?;
    let (_stem, ts) = stem_and_ts.rsplit_once('-')?;
    let nanos: i128 = ts.parse().ok()?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

/// Best-effort content type for a filename, by extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
