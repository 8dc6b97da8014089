//! Core domain types and shared logic for the foliant wiki.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Pages, page metadata, and the denormalized page index
//! - Attachment file descriptors
//! - Wiki configuration and limits
//! - Principals, roles, and the permission evaluator
//! - Object-store key layout and path validation

pub mod config;
pub mod error;
pub mod file;
pub mod keys;
pub mod meta;
pub mod page;
pub mod permissions;
pub mod principal;
pub mod revision;

pub use config::{WikiConfig, WikiFeatures, WikiLimits};
pub use error::{Error, Result};
pub use file::{FileInfo, FileUpload};
pub use keys::{CONFIG_KEY, FILE_PREFIX, INDEX_KEY, PAGE_PREFIX, PAGE_SUFFIX};
pub use meta::{MetadataIndex, MetadataOperation, WikiPageMeta};
pub use page::{Page, PageDocument, PageDraft, PageMetadata};
pub use permissions::{check_permission, Action};
pub use principal::{Principal, Role, SessionToken};
pub use revision::RevisionTag;
