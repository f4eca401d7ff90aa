//! Shared test helpers for in-memory storage integration tests.

use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use taskflow::task::{
    adapters::{InMemoryStorage, MemoryDocument},
    config::TaskServiceConfig,
    services::{TaskService, TaskServiceError},
};

/// Service type used across in-memory integration tests.
pub type MemoryService = TaskService<InMemoryStorage, DefaultClock>;

/// Provides a shared handle to a fresh in-memory document.
#[fixture]
pub fn document() -> MemoryDocument {
    MemoryDocument::new()
}

/// Opens a service over `document` with default configuration.
///
/// # Errors
///
/// Returns the service error when the document cannot be opened.
pub async fn open_service(document: &MemoryDocument) -> Result<MemoryService, TaskServiceError> {
    TaskService::open(
        Arc::new(InMemoryStorage::new(document.clone())),
        Arc::new(DefaultClock),
        TaskServiceConfig::default(),
    )
    .await
}
