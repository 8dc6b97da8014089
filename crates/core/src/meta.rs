//! The denormalized page index and its mutation operations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

/// Index projection of a page, used for listing, search, and hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPageMeta {
    pub path: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub author: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

/// The single index object enumerating all pages.
///
/// Entries are keyed by page path; the `BTreeMap` keeps them in
/// path-lexicographic order, which makes hierarchy construction
/// deterministic. The index is a derived cache of the authoritative page
/// objects: it can always be rebuilt by listing and re-reading them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataIndex {
    #[serde(default)]
    pub pages: BTreeMap<String, WikiPageMeta>,
}

impl MetadataIndex {
    /// Apply a mutation. Add/Update are upsert-by-path and idempotent, so a
    /// retried operation converges to the same index state.
    pub fn apply(&mut self, op: &MetadataOperation) {
        match op {
            MetadataOperation::Add(entry) | MetadataOperation::Update(entry) => {
                self.pages.insert(entry.path.clone(), entry.clone());
            }
            MetadataOperation::Delete { path } => {
                self.pages.remove(path);
            }
        }
    }

    /// Entries in path order, optionally restricted to a path prefix.
    pub fn entries(&self, prefix: Option<&str>) -> Vec<WikiPageMeta> {
        match prefix {
            None => self.pages.values().cloned().collect(),
            Some(prefix) => self
                .pages
                .range(prefix.to_string()..)
                .take_while(|(path, _)| path.starts_with(prefix))
                .map(|(_, entry)| entry.clone())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// A request to mutate the page index.
///
/// This is the unit of work the page repository hands to the index manager
/// after a page write succeeds, keeping the index and the authoritative page
/// objects from drifting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataOperation {
    Add(WikiPageMeta),
    Update(WikiPageMeta),
    Delete { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn entry(path: &str) -> WikiPageMeta {
        WikiPageMeta {
            path: path.to_string(),
            title: path.to_string(),
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-02 0:00 UTC),
            author: "ana".to_string(),
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn add_twice_is_idempotent() {
        let mut index = MetadataIndex::default();
        let op = MetadataOperation::Add(entry("a.md"));
        index.apply(&op);
        index.apply(&op);
        assert_eq!(index.len(), 1);
        assert_eq!(index.pages["a.md"].title, "a.md");
    }

    #[test]
    fn update_replaces_entry() {
        let mut index = MetadataIndex::default();
        index.apply(&MetadataOperation::Add(entry("a.md")));
        let mut updated = entry("a.md");
        updated.title = "renamed".to_string();
        index.apply(&MetadataOperation::Update(updated));
        assert_eq!(index.len(), 1);
        assert_eq!(index.pages["a.md"].title, "renamed");
    }

    #[test]
    fn delete_removes_entry_and_is_idempotent() {
        let mut index = MetadataIndex::default();
        index.apply(&MetadataOperation::Add(entry("a.md")));
        let del = MetadataOperation::Delete {
            path: "a.md".to_string(),
        };
        index.apply(&del);
        index.apply(&del);
        assert!(index.is_empty());
    }

    #[test]
    fn entries_are_path_ordered_and_prefix_filtered() {
        let mut index = MetadataIndex::default();
        for path in ["b/z.md", "a/x.md", "a/y.md", "c.md"] {
            index.apply(&MetadataOperation::Add(entry(path)));
        }
        let all: Vec<_> = index.entries(None).into_iter().map(|e| e.path).collect();
        assert_eq!(all, vec!["a/x.md", "a/y.md", "b/z.md", "c.md"]);

        let under_a: Vec<_> = index
            .entries(Some("a/"))
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(under_a, vec!["a/x.md", "a/y.md"]);
    }

    #[test]
    fn index_round_trip_preserves_order() {
        let mut index = MetadataIndex::default();
        for path in ["b.md", "a.md"] {
            index.apply(&MetadataOperation::Add(entry(path)));
        }
        let json = serde_json::to_string(&index).unwrap();
        let back: MetadataIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }
}
