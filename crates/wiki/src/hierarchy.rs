//! Page hierarchy construction.
//!
//! The tree is derived purely from the index entries' paths; folders exist
//! only as shared path prefixes, never as stored objects.

use foliant_core::WikiPageMeta;
use std::collections::BTreeMap;

/// A node in the page tree: either a synthetic folder or a page leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct PageNode {
    /// Last path segment.
    pub name: String,
    /// Full path from the root. For folders this is the prefix without a
    /// trailing slash.
    pub path: String,
    /// Present iff this node is a page.
    pub page: Option<WikiPageMeta>,
    /// Child nodes: folders first, then pages, each group name-sorted.
    pub children: Vec<PageNode>,
}

impl PageNode {
    pub fn is_folder(&self) -> bool {
        self.page.is_none()
    }
}

#[derive(Default)]
struct FolderBuilder {
    folders: BTreeMap<String, FolderBuilder>,
    pages: BTreeMap<String, WikiPageMeta>,
}

impl FolderBuilder {
    fn insert(&mut self, segments: &[String], entry: WikiPageMeta) {
        match segments {
            [] => {}
            [leaf] => {
                self.pages.insert(leaf.clone(), entry);
            }
            [folder, rest @ ..] => {
                self.folders
                    .entry(folder.clone())
                    .or_default()
                    .insert(rest, entry);
            }
        }
    }

    fn into_nodes(self, prefix: &str) -> Vec<PageNode> {
        let mut nodes = Vec::with_capacity(self.folders.len() + self.pages.len());
        // BTreeMap iteration gives name order within each group.
        for (name, folder) in self.folders {
            let path = join(prefix, &name);
            let children = folder.into_nodes(&path);
            nodes.push(PageNode {
                name,
                path,
                page: None,
                children,
            });
        }
        for (name, entry) in self.pages {
            nodes.push(PageNode {
                path: join(prefix, &name),
                name,
                page: Some(entry),
                children: Vec::new(),
            });
        }
        nodes
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Build the page tree from index entries.
///
/// Deterministic for a given set of entries: the index keeps entries in
/// path-lexicographic order, and within each folder the output is folders
/// first, then pages, both sorted by name.
pub fn build_hierarchy(entries: Vec<WikiPageMeta>) -> Vec<PageNode> {
    let mut root = FolderBuilder::default();
    for entry in entries {
        let segments: Vec<String> = entry.path.split('/').map(str::to_string).collect();
        // Validated paths have no empty segments; skip anything malformed
        // that an out-of-band writer may have put in the index.
        if segments.iter().any(|s| s.is_empty()) {
            tracing::warn!(path = %entry.path, "skipping malformed index entry");
            continue;
        }
        root.insert(&segments, entry);
    }
    root.into_nodes("")
}
