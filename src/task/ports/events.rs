//! Change notifications published after durable mutations, plus storage
//! conditions reported by adapters.

use super::storage::StorageError;
use crate::task::domain::{DataVersion, Task, TaskId};

/// Kind of a bulk mutation, used as the event discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkOperationKind {
    /// Tasks were removed.
    Delete,
    /// Completion flags were set.
    SetCompletion,
    /// Category references were set or cleared.
    SetCategory,
    /// Priorities were set.
    SetPriority,
    /// A general update was merged.
    Update,
}

impl BulkOperationKind {
    /// Returns a stable name for logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::SetCompletion => "set_completion",
            Self::SetCategory => "set_category",
            Self::SetPriority => "set_priority",
            Self::Update => "update",
        }
    }
}

/// A durable change to the task collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// A task was created.
    Created(Task),
    /// A task was modified.
    Updated(Task),
    /// A task was removed.
    Deleted(TaskId),
    /// A bulk mutation touched several tasks.
    BulkOperation {
        /// What the bulk mutation did.
        kind: BulkOperationKind,
        /// Tasks that were changed or removed.
        affected: Vec<TaskId>,
    },
}

/// Receiver of task events.
///
/// Called synchronously on the mutating task; implementations should hand
/// work off rather than block.
pub trait TaskEventListener: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &TaskEvent);
}

/// Condition observed by a storage adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    /// A write was refused because the document would not fit.
    QuotaExceeded {
        /// Encoded document size in bytes.
        required: u64,
        /// Configured capacity in bytes.
        available: u64,
    },
    /// A read, write or migration failed for another reason.
    Failed(StorageError),
    /// The stored document was upgraded.
    DataMigrated {
        /// Version found in storage.
        from: DataVersion,
        /// Version written back.
        to: DataVersion,
    },
}

/// Receiver of storage events. Same calling rules as [`TaskEventListener`].
pub trait StorageEventListener: Send + Sync {
    /// Handles one event.
    fn on_storage_event(&self, event: &StorageEvent);
}
