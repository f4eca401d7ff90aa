//! Task aggregate root and creation payload.

use super::{FieldPatch, TagsPatch, TaskId, TaskUpdate, ValidationError};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Ordinal task priority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal urgency.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// All priorities in ascending order.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidPriority(value.to_owned()))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for creating a task.
///
/// There is no identifier or timestamp field: the repository assigns them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    description: String,
    completed: bool,
    priority: Priority,
    category: Option<String>,
    tags: Vec<String>,
    due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    /// Creates a payload with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the initial completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the category reference.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the tags. Duplicates collapse on creation.
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns the requested title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the requested category reference.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted completion flag.
    pub completed: bool,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted category reference.
    pub category: Option<String>,
    /// Persisted tags.
    pub tags: BTreeSet<String>,
    /// Persisted due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task with a fresh identifier and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] when the title is blank and
    /// [`ValidationError::EmptyTag`] when any tag is blank.
    pub fn create(new_task: NewTask, clock: &impl Clock) -> Result<Self, ValidationError> {
        let title = normalize_title(&new_task.title)?;
        let tags = normalize_tags(new_task.tags)?;
        let category = new_task
            .category
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        let timestamp = clock.utc();

        Ok(Self {
            id: TaskId::new(),
            title,
            description: new_task.description,
            completed: new_task.completed,
            priority: new_task.priority,
            category,
            tags,
            due_date: new_task.due_date,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            completed: data.completed,
            priority: data.priority,
            category: data.category,
            tags: data.tags,
            due_date: data.due_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns whether the task is completed.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the category reference, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the tag set.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the task is open and its due date has passed.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }

    /// Merges the fields present in `update`.
    ///
    /// Every field is validated before anything changes, so a rejected
    /// update leaves the task untouched. Returns whether any field changed.
    /// The modification timestamp is not refreshed here; see [`Self::touch`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the title or a tag is blank.
    pub fn apply(&mut self, update: &TaskUpdate) -> Result<bool, ValidationError> {
        let mut next = self.clone();

        if let Some(title) = &update.title {
            next.title = normalize_title(title)?;
        }
        if let Some(description) = &update.description {
            next.description.clone_from(description);
        }
        if let Some(completed) = update.completed {
            next.completed = completed;
        }
        if let Some(priority) = update.priority {
            next.priority = priority;
        }
        if let Some(patch) = &update.category {
            next.category = match patch {
                FieldPatch::Set(name) => Some(name.trim().to_owned()),
                FieldPatch::Clear => None,
            };
        }
        if let Some(patch) = &update.due_date {
            next.due_date = match patch {
                FieldPatch::Set(due) => Some(*due),
                FieldPatch::Clear => None,
            };
        }
        if let Some(patch) = &update.tags {
            match patch {
                TagsPatch::Replace(tags) => {
                    next.tags = normalize_tags(tags.iter().cloned())?;
                }
                TagsPatch::Add(tag) => {
                    next.tags.insert(normalize_tag(tag)?);
                }
                TagsPatch::Remove(tag) => {
                    next.tags.remove(&normalize_tag(tag)?);
                }
            }
        }

        let changed = next != *self;
        *self = next;
        Ok(changed)
    }

    /// Refreshes the modification timestamp.
    ///
    /// The new value is strictly greater than the previous one even when the
    /// clock has not advanced.
    pub fn touch(&mut self, clock: &impl Clock) {
        let now = clock.utc();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + TimeDelta::nanoseconds(1)
        };
    }
}

/// Trims a title and rejects blank values.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyTitle`] when nothing remains after trimming.
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

/// Trims a tag and rejects blank values.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyTag`] when nothing remains after trimming.
pub fn normalize_tag(tag: &str) -> Result<String, ValidationError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTag);
    }
    Ok(trimmed.to_owned())
}

fn normalize_tags<I, T>(tags: I) -> Result<BTreeSet<String>, ValidationError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| normalize_tag(tag.as_ref()))
        .collect()
}
