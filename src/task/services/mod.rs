//! Application services for the task catalogue.

pub mod aggregator;
pub mod bulk;
pub mod repository;
pub mod selection;
mod snapshot;
mod task_service;

pub use aggregator::{DEFAULT_RECENT_LIMIT, NavigationError};
pub use bulk::{BulkCoordinator, BulkOperation, BulkOutcome};
pub use repository::{BatchUpdate, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use selection::BulkSelection;
pub use task_service::{TaskService, TaskServiceError, TaskServiceResult};
