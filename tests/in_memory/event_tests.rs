//! Storage events reported by the document adapter.

use super::helpers::document;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use taskflow::task::{
    adapters::{ChannelEventListener, InMemoryStorage, MemoryDocument, MigrationRegistry},
    config::TaskServiceConfig,
    domain::{DataVersion, NewTask},
    ports::{StorageErrorCode, StorageEvent},
    services::TaskService,
};
use tokio::sync::mpsc::UnboundedReceiver;

fn observed(document: &MemoryDocument) -> (InMemoryStorage, UnboundedReceiver<StorageEvent>) {
    let (listener, events) = ChannelEventListener::<StorageEvent>::new();
    let storage = InMemoryStorage::new(document.clone()).with_listener(Arc::new(listener));
    (storage, events)
}

fn drain(events: &mut UnboundedReceiver<StorageEvent>) -> Vec<StorageEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

fn legacy_document() -> MemoryDocument {
    MemoryDocument::with_contents(
        json!({
            "tasks": [{
                "id": "6a1f2c3d-8e9b-4a7c-b5d4-e3f2a1b0c9d8",
                "title": "Old chore",
                "priority": "low",
                "createdAt": "2023-06-01T12:00:00Z"
            }]
        })
        .to_string(),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn oversized_write_reports_required_and_available(
    document: MemoryDocument,
) -> eyre::Result<()> {
    let (storage, mut events) = observed(&document);
    let service = TaskService::open(
        Arc::new(storage.with_capacity(600)),
        Arc::new(DefaultClock),
        TaskServiceConfig::default(),
    )
    .await?;
    drain(&mut events);

    let result = service
        .create_task(NewTask::new("Large").with_description("x".repeat(1_000)))
        .await;

    eyre::ensure!(result.is_err(), "oversized write should fail");
    let received = drain(&mut events);
    let [StorageEvent::QuotaExceeded { required, available }] = received.as_slice() else {
        eyre::bail!("expected one quota event, got {received:?}");
    };
    eyre::ensure!(*available == 600, "available was {available}");
    eyre::ensure!(*required > 1_000, "required was {required}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_migration_is_announced() -> eyre::Result<()> {
    let document = legacy_document();
    let (storage, mut events) = observed(&document);

    TaskService::open(
        Arc::new(storage),
        Arc::new(DefaultClock),
        TaskServiceConfig::default(),
    )
    .await?;

    eyre::ensure!(
        drain(&mut events)
            == [StorageEvent::DataMigrated {
                from: DataVersion::V1_0,
                to: DataVersion::CURRENT,
            }],
        "migration event missing"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_migration_step_is_reported_as_failure() -> eyre::Result<()> {
    let document = legacy_document();
    let before = document.contents();
    let (storage, mut events) = observed(&document);

    let result = TaskService::open(
        Arc::new(storage.with_migrations(MigrationRegistry::empty())),
        Arc::new(DefaultClock),
        TaskServiceConfig::default(),
    )
    .await;

    let err = result.err().ok_or_else(|| eyre::eyre!("open should fail"))?;
    eyre::ensure!(
        err.storage_error().map(|storage| storage.code()) == Some(StorageErrorCode::MigrationFailed),
        "unexpected error {err}"
    );
    let received = drain(&mut events);
    eyre::ensure!(
        matches!(
            received.as_slice(),
            [StorageEvent::Failed(failure)] if failure.code() == StorageErrorCode::MigrationFailed
        ),
        "expected one failure event, got {received:?}"
    );
    eyre::ensure!(document.contents() == before, "document must be left untouched");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fresh_store_initialisation_is_silent(document: MemoryDocument) -> eyre::Result<()> {
    let (storage, mut events) = observed(&document);

    TaskService::open(
        Arc::new(storage),
        Arc::new(DefaultClock),
        TaskServiceConfig::default(),
    )
    .await?;

    eyre::ensure!(drain(&mut events).is_empty(), "fresh store should not report events");
    Ok(())
}
