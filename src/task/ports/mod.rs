//! Port contracts for the task catalogue.
//!
//! Ports define infrastructure-agnostic interfaces used by task services
//! and storage adapters.

pub mod events;
pub mod storage;

pub use events::{
    BulkOperationKind, StorageEvent, StorageEventListener, TaskEvent, TaskEventListener,
};
pub use storage::{CallerAction, StorageAdapter, StorageError, StorageErrorCode, StorageResult};
