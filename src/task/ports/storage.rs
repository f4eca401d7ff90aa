//! Storage port for the durable task document.

use crate::task::domain::{Category, DataVersion, Task, UserPreferences};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable store for tasks, categories and preferences.
///
/// Each `save_*` call replaces the whole collection it names and must be
/// atomic: either the new value is durable or the previous one remains.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageAdapter: Send + Sync + 'static {
    /// Replaces the stored task collection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorCode::QuotaExceeded`] when the document would
    /// exceed the store capacity, or another [`StorageError`] on I/O failure.
    async fn save_tasks(&self, tasks: &[Task]) -> StorageResult<()>;

    /// Loads the stored task collection, empty for a fresh store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorCode::ParseError`] when the document is not
    /// decodable.
    async fn load_tasks(&self) -> StorageResult<Vec<Task>>;

    /// Replaces the stored category catalogue.
    ///
    /// # Errors
    ///
    /// As for [`Self::save_tasks`].
    async fn save_categories(&self, categories: &[Category]) -> StorageResult<()>;

    /// Loads the stored category catalogue.
    ///
    /// # Errors
    ///
    /// As for [`Self::load_tasks`].
    async fn load_categories(&self) -> StorageResult<Vec<Category>>;

    /// Replaces the task collection and the category catalogue in one
    /// atomic write.
    ///
    /// # Errors
    ///
    /// As for [`Self::save_tasks`]. Neither collection changes on error.
    async fn save_catalogue(&self, tasks: &[Task], categories: &[Category]) -> StorageResult<()>;

    /// Replaces the stored preferences.
    ///
    /// # Errors
    ///
    /// As for [`Self::save_tasks`].
    async fn save_preferences(&self, preferences: &UserPreferences) -> StorageResult<()>;

    /// Loads the stored preferences, defaults for a fresh store.
    ///
    /// # Errors
    ///
    /// As for [`Self::load_tasks`].
    async fn load_preferences(&self) -> StorageResult<UserPreferences>;

    /// Removes every stored record.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the store cannot be written.
    async fn clear_all_data(&self) -> StorageResult<()>;

    /// Returns the stored document size in bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the store cannot be read.
    async fn storage_size(&self) -> StorageResult<u64>;

    /// Returns `true` when the store accepts reads and writes.
    async fn is_storage_available(&self) -> bool;

    /// Returns the stored schema version, or `None` for a fresh store.
    ///
    /// # Errors
    ///
    /// As for [`Self::load_tasks`].
    async fn data_version(&self) -> StorageResult<Option<DataVersion>>;

    /// Records the schema version without transforming data.
    ///
    /// # Errors
    ///
    /// As for [`Self::save_tasks`].
    async fn set_data_version(&self, version: DataVersion) -> StorageResult<()>;

    /// Upgrades stored data from `from` to `to`.
    ///
    /// Calling this again once the store is at `to` changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorCode::MigrationFailed`] when the stored version
    /// is neither `from` nor `to`, or when no upgrade path exists. The stored
    /// document is left unchanged.
    async fn migrate_data(&self, from: DataVersion, to: DataVersion) -> StorageResult<()>;
}

/// Category of storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorCode {
    /// The document would exceed the store capacity.
    QuotaExceeded,
    /// The store cannot be reached.
    StorageUnavailable,
    /// The stored document is not decodable.
    ParseError,
    /// A schema upgrade could not be applied.
    MigrationFailed,
    /// The store did not answer within the configured bound.
    Timeout,
}

impl StorageErrorCode {
    /// Returns the canonical name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::ParseError => "PARSE_ERROR",
            Self::MigrationFailed => "MIGRATION_FAILED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller should do about a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerAction {
    /// Free space, for example by deleting completed tasks, then retry.
    TriggerCleanup,
    /// Stop issuing writes until the store recovers.
    BlockWrites,
    /// Show the failure to the user; retrying will not help.
    SurfaceToUser,
    /// The failure is transient; the operation may be retried.
    Retry,
}

/// Storage failure with a machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {details}")]
pub struct StorageError {
    code: StorageErrorCode,
    details: String,
}

impl StorageError {
    /// Creates an error from its parts.
    #[must_use]
    pub fn new(code: StorageErrorCode, details: impl Into<String>) -> Self {
        Self {
            code,
            details: details.into(),
        }
    }

    /// Document of `required` bytes does not fit in `available` bytes.
    #[must_use]
    pub fn quota_exceeded(required: u64, available: u64) -> Self {
        Self::new(
            StorageErrorCode::QuotaExceeded,
            format!("required {required} bytes, available {available} bytes"),
        )
    }

    /// The store cannot be reached.
    #[must_use]
    pub fn unavailable(details: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::StorageUnavailable, details)
    }

    /// The stored document is not decodable.
    #[must_use]
    pub fn parse(details: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::ParseError, details)
    }

    /// A schema upgrade failed.
    #[must_use]
    pub fn migration_failed(details: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::MigrationFailed, details)
    }

    /// The store did not answer within `after`.
    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self::new(
            StorageErrorCode::Timeout,
            format!("no response within {} ms", after.as_millis()),
        )
    }

    /// Returns the failure code.
    #[must_use]
    pub const fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the human-readable details.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Maps the failure to the action a caller should take.
    #[must_use]
    pub const fn recommended_action(&self) -> CallerAction {
        match self.code {
            StorageErrorCode::QuotaExceeded => CallerAction::TriggerCleanup,
            StorageErrorCode::StorageUnavailable | StorageErrorCode::MigrationFailed => {
                CallerAction::BlockWrites
            }
            StorageErrorCode::ParseError => CallerAction::SurfaceToUser,
            StorageErrorCode::Timeout => CallerAction::Retry,
        }
    }

    /// Returns `true` when retrying the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.recommended_action(), CallerAction::Retry)
    }
}
