//! Attachment upload validation and retrieval.

mod common;

use bytes::Bytes;
use foliant_core::{FileUpload, MetadataOperation, PageDraft, WikiConfig, WikiPageMeta};
use foliant_storage::PutOptions;
use foliant_wiki::{PageIndexManager, WikiError};
use std::collections::BTreeSet;
use std::sync::Arc;
use time::OffsetDateTime;

#[tokio::test]
async fn upload_and_get_round_trip() {
    let (wiki, _store, _provider) = common::admin_wiki().await;

    let payload = Bytes::from_static(b"\x89PNG data");
    let info = wiki
        .upload_file(FileUpload::new("team photo.png", payload.clone()))
        .await
        .unwrap();
    assert!(info.id.starts_with("team_photo-"));
    assert!(info.id.ends_with(".png"));
    assert_eq!(info.content_type, "image/png");
    assert_eq!(info.size, payload.len() as u64);
    assert_eq!(info.url, format!("files/{}", info.id));

    let (fetched, data) = wiki.get_file(&info.id).await.unwrap();
    assert_eq!(data, payload);
    assert_eq!(fetched.id, info.id);
    assert_eq!(fetched.filename, "team_photo.png");
    assert_eq!(fetched.uploaded_at, info.uploaded_at);
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_writing() {
    let (wiki, store, _provider) = common::admin_wiki().await;

    let mut config = WikiConfig::default();
    config.limits.max_file_size = 4;
    wiki.save_config(config).await.unwrap();

    let err = wiki
        .upload_file(FileUpload::new("big.png", Bytes::from_static(b"12345")))
        .await
        .unwrap_err();
    assert!(matches!(err, WikiError::FileTooLarge { size: 5, limit: 4 }));
    assert!(store.list("files/").await.unwrap().is_empty());
}

#[tokio::test]
async fn disallowed_extension_is_rejected() {
    let (wiki, store, _provider) = common::admin_wiki().await;

    let err = wiki
        .upload_file(FileUpload::new("payload.exe", Bytes::from_static(b"MZ")))
        .await
        .unwrap_err();
    assert!(matches!(err, WikiError::InvalidFileType(ext) if ext == "exe"));
    assert!(store.list("files/").await.unwrap().is_empty());
}

#[tokio::test]
async fn per_page_quota_blocks_further_attachments() {
    let (wiki, _store, _provider) = common::admin_wiki().await;

    let mut config = WikiConfig::default();
    config.limits.max_files_per_page = 1;
    wiki.save_config(config).await.unwrap();

    let first = wiki
        .upload_file(FileUpload::new("one.png", Bytes::from_static(b"1")))
        .await
        .unwrap();
    let content = format!("uses {}", first.id);
    wiki.save_page(PageDraft::new("doc.md", "Doc", content, "root"), None)
        .await
        .unwrap();

    let err = wiki
        .upload_file(FileUpload::new("two.png", Bytes::from_static(b"2")).for_page("doc.md"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WikiError::FileQuotaReached { limit: 1, .. }
    ));

    // Without a target page the quota does not apply.
    wiki.upload_file(FileUpload::new("two.png", Bytes::from_static(b"2")))
        .await
        .unwrap();
}

#[tokio::test]
async fn quota_ignores_files_the_page_does_not_reference() {
    let (wiki, _store, _provider) = common::admin_wiki().await;

    let mut config = WikiConfig::default();
    config.limits.max_files_per_page = 1;
    wiki.save_config(config).await.unwrap();

    wiki.upload_file(FileUpload::new("unrelated.png", Bytes::from_static(b"1")))
        .await
        .unwrap();
    wiki.save_page(
        PageDraft::new("doc.md", "Doc", "no attachments here", "root"),
        None,
    )
    .await
    .unwrap();

    // The page references nothing, so one more attachment fits.
    wiki.upload_file(FileUpload::new("fits.png", Bytes::from_static(b"2")).for_page("doc.md"))
        .await
        .unwrap();
}

#[tokio::test]
async fn list_files_reports_each_upload() {
    let (wiki, _store, _provider) = common::admin_wiki().await;

    let a = wiki
        .upload_file(FileUpload::new("a.pdf", Bytes::from_static(b"%PDF")))
        .await
        .unwrap();
    let b = wiki
        .upload_file(FileUpload::new("b.txt", Bytes::from_static(b"text")))
        .await
        .unwrap();

    let mut ids: Vec<_> = wiki
        .list_files()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    ids.sort();
    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let (wiki, _store, _provider) = common::admin_wiki().await;

    assert!(matches!(
        wiki.get_file("ghost-1.png").await.unwrap_err(),
        WikiError::FileNotFound(_)
    ));
    assert!(matches!(
        wiki.delete_file("ghost-1.png").await.unwrap_err(),
        WikiError::FileNotFound(_)
    ));
}

#[tokio::test]
async fn unparsable_page_still_counts_as_a_reference() {
    let (wiki, store, _provider) = common::admin_wiki().await;

    let img = wiki
        .upload_file(FileUpload::new("img.png", Bytes::from_static(b"png")))
        .await
        .unwrap();

    // An out-of-band writer left a non-JSON page object that mentions the
    // file id in its raw bytes.
    let raw = format!("plain markdown, not a document: see {}", img.id);
    store
        .put("pages/raw.md", Bytes::from(raw), PutOptions::overwrite())
        .await
        .unwrap();
    let now = OffsetDateTime::now_utc();
    PageIndexManager::new(Arc::clone(&store))
        .apply(&MetadataOperation::Add(WikiPageMeta {
            path: "raw.md".to_string(),
            title: "raw".to_string(),
            created_at: now,
            updated_at: now,
            author: "root".to_string(),
            tags: BTreeSet::new(),
        }))
        .await
        .unwrap();

    // The unreadable page is scanned as raw text, so the file stays.
    let orphans = wiki.find_orphaned_files("other.md").await.unwrap();
    assert!(orphans.is_empty());
}

#[tokio::test]
async fn deleting_absent_orphans_counts_as_deleted() {
    let (wiki, _store, _provider) = common::admin_wiki().await;

    let failed = wiki
        .delete_orphaned_files(&["already-gone-1.png".to_string()])
        .await
        .unwrap();
    assert!(failed.is_empty());
}
