//! Runtime configuration for the task service.
//!
//! Values come from compiled defaults, optionally overridden by a TOML
//! document:
//!
//! ```toml
//! max_bulk_items = 25
//! recent_tasks_limit = 10
//! storage_timeout_ms = 2000
//! max_title_chars = 120
//! category_deletion = "reject"
//! ```

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Hard ceiling on the number of tasks a bulk request may name.
pub const MAX_BULK_ITEMS: usize = 50;

/// What happens to referencing tasks when a category is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDeletionPolicy {
    /// Clear the reference on every task, then delete the category.
    #[default]
    Detach,
    /// Refuse while any task references the category.
    Reject,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML document could not be parsed.
    #[error("failed to parse config: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A limit must be at least one.
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    /// The bulk limit exceeds the hard ceiling.
    #[error("max_bulk_items {requested} exceeds the ceiling of {MAX_BULK_ITEMS}")]
    BulkLimitTooHigh {
        /// The configured value.
        requested: usize,
    },
}

/// Task service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskServiceConfig {
    /// Maximum distinct tasks per bulk request. At most [`MAX_BULK_ITEMS`].
    pub max_bulk_items: usize,
    /// Default number of entries returned by recent-task queries.
    pub recent_tasks_limit: usize,
    /// Upper bound on a single storage call.
    pub storage_timeout: Duration,
    /// Maximum title length in characters.
    pub max_title_chars: usize,
    /// Behaviour of category deletion.
    pub category_deletion: CategoryDeletionPolicy,
}

impl Default for TaskServiceConfig {
    fn default() -> Self {
        Self {
            max_bulk_items: MAX_BULK_ITEMS,
            recent_tasks_limit: 5,
            storage_timeout: Duration::from_secs(5),
            max_title_chars: 200,
            category_deletion: CategoryDeletionPolicy::Detach,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TaskServiceConfigFile {
    max_bulk_items: Option<usize>,
    recent_tasks_limit: Option<usize>,
    storage_timeout_ms: Option<u64>,
    max_title_chars: Option<usize>,
    category_deletion: Option<CategoryDeletionPolicy>,
}

impl TaskServiceConfig {
    /// Creates a configuration that refuses to delete categories in use and
    /// keeps bulk requests small.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            max_bulk_items: 20,
            recent_tasks_limit: 5,
            storage_timeout: Duration::from_secs(2),
            max_title_chars: 100,
            category_deletion: CategoryDeletionPolicy::Reject,
        }
    }

    /// Sets the storage timeout.
    #[must_use]
    pub const fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Sets the category deletion policy.
    #[must_use]
    pub const fn with_category_deletion(mut self, policy: CategoryDeletionPolicy) -> Self {
        self.category_deletion = policy;
        self
    }

    /// Parses a TOML document over the defaults and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseToml`] for malformed input and a
    /// validation variant for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: TaskServiceConfigFile = toml::from_str(text)?;
        let config = Self::resolve(&file);
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFile`] when the file cannot be read, or
    /// any error from [`Self::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let read_error = |source| ConfigError::ReadFile {
            path: path.to_string(),
            source,
        };
        let file_name = path.file_name().ok_or_else(|| {
            read_error(std::io::Error::other("path must include a file name"))
        })?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let text = dir.read_to_string(file_name).map_err(read_error)?;
        Self::from_toml_str(&text)
    }

    /// Checks every limit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroLimit`] for a zero limit or timeout and
    /// [`ConfigError::BulkLimitTooHigh`] above [`MAX_BULK_ITEMS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bulk_items == 0 {
            return Err(ConfigError::ZeroLimit("max_bulk_items"));
        }
        if self.max_bulk_items > MAX_BULK_ITEMS {
            return Err(ConfigError::BulkLimitTooHigh {
                requested: self.max_bulk_items,
            });
        }
        if self.recent_tasks_limit == 0 {
            return Err(ConfigError::ZeroLimit("recent_tasks_limit"));
        }
        if self.max_title_chars == 0 {
            return Err(ConfigError::ZeroLimit("max_title_chars"));
        }
        if self.storage_timeout.is_zero() {
            return Err(ConfigError::ZeroLimit("storage_timeout_ms"));
        }
        Ok(())
    }

    fn resolve(file: &TaskServiceConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            max_bulk_items: file.max_bulk_items.unwrap_or(defaults.max_bulk_items),
            recent_tasks_limit: file
                .recent_tasks_limit
                .unwrap_or(defaults.recent_tasks_limit),
            storage_timeout: file
                .storage_timeout_ms
                .map_or(defaults.storage_timeout, Duration::from_millis),
            max_title_chars: file.max_title_chars.unwrap_or(defaults.max_title_chars),
            category_deletion: file
                .category_deletion
                .unwrap_or(defaults.category_deletion),
        }
    }
}
