//! Category catalogue entries.

use super::{CategoryId, ValidationError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Named grouping that tasks reference by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: CategoryId,
    name: String,
    #[serde(default)]
    color: Option<String>,
    created_at: DateTime<Utc>,
}

impl Category {
    /// Creates a category with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCategoryName`] when the name is blank.
    pub fn new(
        name: &str,
        color: Option<String>,
        clock: &impl Clock,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: CategoryId::new(),
            name: normalize_category_name(name)?,
            color: color.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty()),
            created_at: clock.utc(),
        })
    }

    /// Returns the category identifier.
    #[must_use]
    pub const fn id(&self) -> CategoryId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display colour, if any.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` when `name` refers to this category, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Trims a category name and rejects blank values.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyCategoryName`] when nothing remains.
pub fn normalize_category_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCategoryName);
    }
    Ok(trimmed.to_owned())
}
