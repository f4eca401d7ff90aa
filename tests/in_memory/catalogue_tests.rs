//! Round trips of tasks, categories and preferences through a service.

use super::helpers::{document, open_service};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use taskflow::task::{
    adapters::MemoryDocument,
    domain::{NewTask, Priority, SortDirection, SortField, SortSpec, Theme, UserPreferences},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopened_service_sees_identical_catalogue(document: MemoryDocument) -> eyre::Result<()> {
    let due = Utc
        .with_ymd_and_hms(2030, 5, 17, 12, 0, 0)
        .single()
        .ok_or_else(|| eyre::eyre!("invalid fixed due date"))?;
    let first = open_service(&document).await?;
    first.create_category("Work", Some("#224466".to_owned())).await?;
    first
        .create_task(
            NewTask::new("Prepare slides")
                .with_description("Quarterly review deck")
                .with_priority(Priority::High)
                .with_category("work")
                .with_tags(["review", "slides"])
                .with_due_date(due),
        )
        .await?;
    first.create_task(NewTask::new("Book room")).await?;
    first
        .update_preferences(UserPreferences {
            theme: Theme::Dark,
            default_sort: SortSpec::new(SortField::DueDate, SortDirection::Ascending),
            ..UserPreferences::default()
        })
        .await?;

    let second = open_service(&document).await?;

    eyre::ensure!(
        second.tasks().await == first.tasks().await,
        "tasks differ after reopen"
    );
    eyre::ensure!(
        second.categories().await == first.categories().await,
        "categories differ after reopen"
    );
    eyre::ensure!(
        second.preferences().await == first.preferences().await,
        "preferences differ after reopen"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_tasks_stay_deleted_after_reopen(document: MemoryDocument) -> eyre::Result<()> {
    let service = open_service(&document).await?;
    let kept = service.create_task(NewTask::new("Kept")).await?;
    let dropped = service.create_task(NewTask::new("Dropped")).await?;
    service.delete_task(dropped.id()).await?;

    let reopened = open_service(&document).await?;

    eyre::ensure!(
        reopened.tasks().await == vec![kept],
        "only the kept task should survive"
    );
    eyre::ensure!(
        reopened.task(dropped.id()).await.is_none(),
        "deleted task must not be readable"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_document_uses_camel_case_layout(document: MemoryDocument) -> eyre::Result<()> {
    let service = open_service(&document).await?;
    service.create_task(NewTask::new("Layout")).await?;

    let raw = document
        .contents()
        .ok_or_else(|| eyre::eyre!("document should be written"))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    eyre::ensure!(value["version"] == "1.1", "unexpected version {}", value["version"]);
    let task = value["tasks"]
        .get(0)
        .ok_or_else(|| eyre::eyre!("task record missing"))?;
    for field in ["id", "title", "createdAt", "updatedAt", "tags", "priority"] {
        eyre::ensure!(task.get(field).is_some(), "missing field {field}");
    }
    eyre::ensure!(
        service.storage_size().await? == u64::try_from(raw.len())?,
        "storage size should match document length"
    );
    Ok(())
}
