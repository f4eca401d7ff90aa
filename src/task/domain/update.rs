//! Typed update descriptor for partial task edits.

use super::{Priority, ValidationError, normalize_tag, normalize_title};
use chrono::{DateTime, Utc};

/// Patch for a nullable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Overwrite with the provided value.
    Set(T),
    /// Reset the field to empty.
    Clear,
}

impl<T> FieldPatch<T> {
    /// Builds a patch from an optional value, mapping `None` to [`Self::Clear`].
    #[must_use]
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

/// Patch for the tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagsPatch {
    /// Replace the whole set.
    Replace(Vec<String>),
    /// Add one tag; adding a present tag changes nothing.
    Add(String),
    /// Remove one tag; removing an absent tag changes nothing.
    Remove(String),
}

/// Partial task update.
///
/// Each `None` field is left unchanged. Nullable fields use [`FieldPatch`]
/// so that clearing a value is distinct from leaving it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    /// Overwrite the title.
    pub title: Option<String>,
    /// Overwrite the description.
    pub description: Option<String>,
    /// Overwrite the completion flag.
    pub completed: Option<bool>,
    /// Overwrite the priority.
    pub priority: Option<Priority>,
    /// Patch the category reference.
    pub category: Option<FieldPatch<String>>,
    /// Patch the due date.
    pub due_date: Option<FieldPatch<DateTime<Utc>>>,
    /// Patch the tag set.
    pub tags: Option<TagsPatch>,
}

impl TaskUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the completion flag.
    #[must_use]
    pub const fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets or clears the category reference.
    #[must_use]
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = Some(FieldPatch::from_option(category));
        self
    }

    /// Sets or clears the due date.
    #[must_use]
    pub fn due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(FieldPatch::from_option(due_date));
        self
    }

    /// Replaces the tag set.
    #[must_use]
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(TagsPatch::Replace(tags.into_iter().map(Into::into).collect()));
        self
    }

    /// Returns the category name this update would assign, if any.
    #[must_use]
    pub fn assigned_category(&self) -> Option<&str> {
        match &self.category {
            Some(FieldPatch::Set(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Checks the present fields without applying them.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] or [`ValidationError::EmptyTag`]
    /// for blank values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            normalize_title(title)?;
        }
        match &self.tags {
            Some(TagsPatch::Replace(tags)) => {
                for tag in tags {
                    normalize_tag(tag)?;
                }
            }
            Some(TagsPatch::Add(tag) | TagsPatch::Remove(tag)) => {
                normalize_tag(tag)?;
            }
            None => {}
        }
        Ok(())
    }

    /// Returns true when no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
    }
}
