//! Error types for task domain validation and lookups.

use super::TaskId;
use thiserror::Error;

/// Input rejected before anything is mutated or persisted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the configured length.
    #[error("task title has {actual} characters, exceeds limit of {max}")]
    TitleTooLong {
        /// The maximum allowed number of characters.
        max: usize,
        /// The actual number of characters.
        actual: usize,
    },

    /// The priority value is not one of `low`, `medium` or `high`.
    #[error("unknown priority '{0}', expected low, medium or high")]
    InvalidPriority(String),

    /// A tag is empty after trimming.
    #[error("tags must not be empty")]
    EmptyTag,

    /// A category name is empty after trimming.
    #[error("category name must not be empty")]
    EmptyCategoryName,

    /// A category with the same name already exists.
    #[error("category '{0}' already exists")]
    DuplicateCategory(String),

    /// The referenced category is not part of the catalogue.
    #[error("category '{0}' does not exist")]
    UnknownCategory(String),

    /// The category cannot be removed while tasks reference it.
    #[error("category '{name}' is still referenced by {tasks} task(s)")]
    CategoryInUse {
        /// Name of the category.
        name: String,
        /// Number of referencing tasks.
        tasks: usize,
    },

    /// A date range filter has its start after its end.
    #[error("date range start must not be after its end")]
    InvertedDateRange,

    /// A bulk request names more tasks than allowed.
    #[error("bulk request has {actual} tasks, exceeds limit of {max}")]
    BulkLimitExceeded {
        /// The maximum allowed number of tasks.
        max: usize,
        /// The actual number of distinct tasks.
        actual: usize,
    },

    /// A schema version string is malformed.
    #[error("invalid data version '{0}', expected <major>.<minor>")]
    InvalidDataVersion(String),
}

/// A referenced record is absent from the live collection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotFoundError {
    /// No task has the given identifier.
    #[error("task not found: {0}")]
    Task(TaskId),

    /// No category has the given name.
    #[error("category not found: {0}")]
    Category(String),
}
