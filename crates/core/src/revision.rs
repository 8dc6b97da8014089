//! Revision tags (entity tags) for optimistic concurrency.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque fingerprint of an object's stored state.
///
/// A `RevisionTag` is the optimistic-lock token of the save protocol: a page
/// read carries the tag observed at that read, and a conditional write
/// succeeds only while the stored tag still matches. The format is
/// backend-specific (an S3 ETag, a content hash, ...) and must never be
/// parsed — only compared for equality.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionTag(String);

impl RevisionTag {
    /// Wrap a backend-provided tag value.
    ///
    /// Surrounding double quotes (as returned in HTTP ETag headers) are
    /// stripped so tags from different code paths compare equal.
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let trimmed = tag.trim_matches('"');
        if trimmed.len() == tag.len() {
            Self(tag)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// The raw tag value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RevisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionTag({})", self.0)
    }
}

impl From<&str> for RevisionTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
