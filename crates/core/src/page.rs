//! Page documents and metadata.

use crate::meta::WikiPageMeta;
use crate::revision::RevisionTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::OffsetDateTime;

/// Per-page metadata stored alongside the content.
///
/// `version` is monotonic per path and increments on every successful save.
/// It is the authoritative staleness signal independent of the revision-tag
/// format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub author: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

/// The stored JSON form of a page.
///
/// The object-store revision tag of this document is the page's optimistic
/// lock token; it is not part of the document itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDocument {
    pub title: String,
    pub content: String,
    pub metadata: PageMetadata,
}

/// A page as observed by a read.
///
/// Invariant: `revision` is the tag the store reported at the moment the
/// document was fetched. Passing it back to a save makes the save
/// conditional on the page not having changed since.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub path: String,
    pub title: String,
    pub content: String,
    pub metadata: PageMetadata,
    pub revision: RevisionTag,
}

impl Page {
    /// Assemble a page from its stored document and the tag observed reading it.
    pub fn from_document(path: impl Into<String>, doc: PageDocument, revision: RevisionTag) -> Self {
        Self {
            path: path.into(),
            title: doc.title,
            content: doc.content,
            metadata: doc.metadata,
            revision,
        }
    }

    /// The stored form of this page.
    pub fn document(&self) -> PageDocument {
        PageDocument {
            title: self.title.clone(),
            content: self.content.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// The index projection of this page.
    pub fn index_entry(&self) -> WikiPageMeta {
        WikiPageMeta {
            path: self.path.clone(),
            title: self.title.clone(),
            created_at: self.metadata.created_at,
            updated_at: self.metadata.updated_at,
            author: self.metadata.author.clone(),
            tags: self.metadata.tags.clone(),
        }
    }
}

/// Caller-supplied input for a page save.
///
/// The repository stamps timestamps and the version; drafts never carry
/// revision state of their own.
#[derive(Clone, Debug)]
pub struct PageDraft {
    pub path: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub tags: BTreeSet<String>,
}

impl PageDraft {
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            content: content.into(),
            author: author.into(),
            tags: BTreeSet::new(),
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_metadata() -> PageMetadata {
        PageMetadata {
            created_at: datetime!(2024-05-01 10:00 UTC),
            updated_at: datetime!(2024-05-02 11:30 UTC),
            author: "mika".to_string(),
            version: 3,
            tags: BTreeSet::from(["howto".to_string()]),
        }
    }

    #[test]
    fn document_round_trip() {
        let doc = PageDocument {
            title: "Setup".to_string(),
            content: "# Setup\n".to_string(),
            metadata: sample_metadata(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: PageDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn empty_tags_omitted_from_json() {
        let mut meta = sample_metadata();
        meta.tags.clear();
        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("tags"));
        let back: PageMetadata = serde_json::from_str(&json).unwrap();
        assert!(back.tags.is_empty());
    }

    #[test]
    fn index_entry_projects_page_fields() {
        let page = Page::from_document(
            "guides/setup.md",
            PageDocument {
                title: "Setup".to_string(),
                content: "body".to_string(),
                metadata: sample_metadata(),
            },
            RevisionTag::new("t1"),
        );
        let entry = page.index_entry();
        assert_eq!(entry.path, "guides/setup.md");
        assert_eq!(entry.title, "Setup");
        assert_eq!(entry.updated_at, page.metadata.updated_at);
        assert_eq!(entry.author, "mika");
    }
}
