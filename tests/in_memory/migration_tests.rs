//! Opening legacy documents and repeated schema upgrades.

use super::helpers::open_service;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use taskflow::task::{
    adapters::{InMemoryStorage, MemoryDocument},
    domain::{DataVersion, Priority},
    ports::{StorageAdapter, StorageErrorCode},
};

fn legacy_document() -> String {
    json!({
        "tasks": [{
            "id": "0b5e3c1a-4f5d-4c3e-9a1b-6f0d8e2a7c44",
            "title": "Legacy errand",
            "priority": "HIGH",
            "createdAt": "2023-11-02T08:30:00Z",
            "tags": ["home", " home ", ""]
        }],
        "categories": []
    })
    .to_string()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn legacy_document_is_upgraded_on_open() -> eyre::Result<()> {
    let document = MemoryDocument::with_contents(legacy_document());

    let service = open_service(&document).await?;

    let tasks = service.tasks().await;
    let task = tasks
        .first()
        .ok_or_else(|| eyre::eyre!("legacy task should load"))?;
    eyre::ensure!(task.priority() == Priority::High, "priority not normalized");
    eyre::ensure!(task.updated_at() == task.created_at(), "updatedAt not backfilled");
    eyre::ensure!(task.tags().len() == 1, "tags not deduplicated: {:?}", task.tags());

    let storage = InMemoryStorage::new(document.clone());
    eyre::ensure!(
        storage.data_version().await? == Some(DataVersion::CURRENT),
        "document not stamped with current version"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn migrating_twice_is_a_noop() -> eyre::Result<()> {
    let seeded = MemoryDocument::with_contents(legacy_document());
    let storage = InMemoryStorage::new(seeded.clone());

    storage
        .migrate_data(DataVersion::V1_0, DataVersion::V1_1)
        .await?;
    let once = seeded.contents();
    storage
        .migrate_data(DataVersion::V1_0, DataVersion::V1_1)
        .await?;

    eyre::ensure!(seeded.contents() == once, "second migration changed the document");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn newer_document_is_refused() -> eyre::Result<()> {
    let document = MemoryDocument::with_contents(
        json!({ "version": "2.0", "tasks": [] }).to_string(),
    );
    let before = document.contents();

    let result = open_service(&document).await;

    let err = result.err().ok_or_else(|| eyre::eyre!("open should fail"))?;
    eyre::ensure!(
        err.storage_error().map(|storage| storage.code()) == Some(StorageErrorCode::MigrationFailed),
        "unexpected error {err}"
    );
    eyre::ensure!(document.contents() == before, "document must be left untouched");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mismatched_source_version_fails() -> eyre::Result<()> {
    let storage = Arc::new(InMemoryStorage::in_memory());
    storage.set_data_version(DataVersion::V1_1).await?;

    let result = storage
        .migrate_data(DataVersion::new(0, 9), DataVersion::new(1, 2))
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("migration should fail"))?;
    eyre::ensure!(
        err.code() == StorageErrorCode::MigrationFailed,
        "unexpected error {err}"
    );
    Ok(())
}
