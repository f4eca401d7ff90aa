//! Shared world state for task catalogue scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskflow::task::{
    adapters::{InMemoryStorage, MemoryDocument},
    config::TaskServiceConfig,
    domain::{Task, TaskNavigationContext},
    services::{BulkOutcome, TaskService, TaskServiceError},
};

/// Service type used by the scenario world.
pub type CatalogueService = TaskService<InMemoryStorage, DefaultClock>;

/// Scenario world for task catalogue behaviour tests.
pub struct CatalogueWorld {
    pub storage: Arc<InMemoryStorage>,
    pub service: CatalogueService,
    pub tasks_by_title: HashMap<String, Task>,
    pub results: Vec<Task>,
    pub last_error: Option<TaskServiceError>,
    pub last_outcome: Option<BulkOutcome>,
    pub navigation: Option<TaskNavigationContext>,
    pub toggled: Option<Task>,
    pub saved: Vec<Task>,
    pub legacy: Option<(InMemoryStorage, MemoryDocument)>,
    pub migrated_once: Option<String>,
    pub migrated_twice: Option<String>,
}

impl CatalogueWorld {
    /// Opens a service over fresh in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns the service error when the store cannot be opened.
    pub fn open() -> Result<Self, TaskServiceError> {
        let storage = Arc::new(InMemoryStorage::in_memory());
        let service = open_blocking(TaskService::open(
            Arc::clone(&storage),
            Arc::new(DefaultClock),
            TaskServiceConfig::default(),
        ))?;
        Ok(Self {
            storage,
            service,
            tasks_by_title: HashMap::new(),
            results: Vec::new(),
            last_error: None,
            last_outcome: None,
            navigation: None,
            toggled: None,
            saved: Vec::new(),
            legacy: None,
            migrated_once: None,
            migrated_twice: None,
        })
    }

    /// Returns the task created under `title` in an earlier step.
    ///
    /// # Errors
    ///
    /// Returns an error when no step created a task with that title.
    pub fn task(&self, title: &str) -> Result<&Task, eyre::Report> {
        self.tasks_by_title
            .get(title)
            .ok_or_else(|| eyre::eyre!("no task titled {title:?} in scenario world"))
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> CatalogueWorld {
    CatalogueWorld::open().expect("in-memory service should open")
}

/// Drives `future` on the ambient runtime, or on a private one when the
/// fixture is resolved outside any runtime.
fn open_blocking<T>(future: impl std::future::Future<Output = T>) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(future)),
        Err(_) => tokio::runtime::Runtime::new()
            .expect("scenario runtime should start")
            .block_on(future),
    }
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
