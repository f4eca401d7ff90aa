//! Quota, availability and corrupt-document handling.

use super::helpers::{document, open_service};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use taskflow::task::{
    adapters::{InMemoryStorage, MemoryDocument},
    config::TaskServiceConfig,
    domain::NewTask,
    ports::{CallerAction, StorageErrorCode},
    services::{TaskService, TaskServiceError},
};

fn storage_code(err: &TaskServiceError) -> Option<StorageErrorCode> {
    err.storage_error().map(|storage| storage.code())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn quota_exceeded_keeps_previous_state(document: MemoryDocument) -> eyre::Result<()> {
    let storage = Arc::new(InMemoryStorage::new(document.clone()).with_capacity(600));
    let service = TaskService::open(
        Arc::clone(&storage),
        Arc::new(DefaultClock),
        TaskServiceConfig::default(),
    )
    .await?;
    let small = service.create_task(NewTask::new("Small")).await?;
    let before = document.contents();

    let result = service
        .create_task(NewTask::new("Large").with_description("x".repeat(1_000)))
        .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("oversized write should fail"))?;
    eyre::ensure!(
        storage_code(&err) == Some(StorageErrorCode::QuotaExceeded),
        "unexpected error {err}"
    );
    eyre::ensure!(
        err.storage_error().map(|storage| storage.recommended_action())
            == Some(CallerAction::TriggerCleanup),
        "quota failures should recommend cleanup"
    );
    eyre::ensure!(service.tasks().await == vec![small], "memory state changed");
    eyre::ensure!(document.contents() == before, "stored document changed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn corrupt_document_is_reported_as_parse_error() -> eyre::Result<()> {
    let document = MemoryDocument::with_contents("{ not json");

    let result = open_service(&document).await;

    let err = result.err().ok_or_else(|| eyre::eyre!("open should fail"))?;
    eyre::ensure!(
        storage_code(&err) == Some(StorageErrorCode::ParseError),
        "unexpected error {err}"
    );
    eyre::ensure!(!err.is_retryable(), "parse errors are not retryable");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unavailable_storage_blocks_writes(document: MemoryDocument) -> eyre::Result<()> {
    let service = open_service(&document).await?;
    document.set_available(false);

    let result = service.create_category("Later", None).await;
    document.set_available(true);

    let err = result.err().ok_or_else(|| eyre::eyre!("write should fail"))?;
    eyre::ensure!(
        err.storage_error().map(|storage| storage.recommended_action())
            == Some(CallerAction::BlockWrites),
        "unexpected action for {err}"
    );
    eyre::ensure!(service.categories().await.is_empty(), "category leaked");
    Ok(())
}
