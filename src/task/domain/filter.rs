//! Filter, search and sort engine over task snapshots.
//!
//! Everything here is pure: callers pass a borrowed task collection and get
//! back a verdict or an ordering. Predicates are ANDed and unset fields
//! impose nothing.

use super::{Priority, Task, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Category predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Tasks without a category.
    Uncategorized,
    /// Tasks in the named category, compared case-insensitively.
    Named(String),
}

/// Inclusive due-date window. An open end imposes no bound on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Earliest accepted due date.
    pub start: Option<DateTime<Utc>>,
    /// Latest accepted due date.
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Creates a range from optional bounds.
    #[must_use]
    pub const fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Checks that the start does not come after the end.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedDateRange`] for a reversed range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(ValidationError::InvertedDateRange),
            _ => Ok(()),
        }
    }

    fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| instant >= start)
            && self.end.is_none_or(|end| instant <= end)
    }
}

/// Transient presentation filter. Never persisted with task data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Completion predicate.
    pub completed: Option<bool>,
    /// Category predicate.
    pub category: Option<CategoryFilter>,
    /// Exact priority predicate.
    pub priority: Option<Priority>,
    /// Case-insensitive exact tag predicate.
    pub tag: Option<String>,
    /// Free-text search tokens.
    pub search: String,
    /// Due-date window.
    pub due: Option<DateRange>,
}

impl FilterState {
    /// Creates an empty filter that matches every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to tasks with the given completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Restricts by category.
    #[must_use]
    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts to one priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts to tasks carrying the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the free-text search.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Restricts to a due-date window.
    #[must_use]
    pub const fn with_due(mut self, due: DateRange) -> Self {
        self.due = Some(due);
        self
    }

    /// Checks the filter for malformed predicates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedDateRange`] for a reversed window.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.due.as_ref().map_or(Ok(()), DateRange::validate)
    }

    /// Returns `true` when no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.tag.is_none()
            && self.search.trim().is_empty()
            && self.due.is_none()
    }
}

/// Compiled filter with lowercased search tokens.
///
/// Compile once and reuse across a collection rather than calling
/// [`matches`] per task.
#[derive(Debug, Clone)]
pub struct TaskMatcher {
    completed: Option<bool>,
    category: Option<CategoryFilter>,
    priority: Option<Priority>,
    tag: Option<String>,
    due: Option<DateRange>,
    tokens: Vec<String>,
}

impl TaskMatcher {
    /// Compiles a filter plus an extra free-text query.
    ///
    /// Tokens from `filter.search` and `query` are both applied.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedDateRange`] for a reversed window.
    pub fn new(filter: &FilterState, query: &str) -> Result<Self, ValidationError> {
        filter.validate()?;
        let tokens = filter
            .search
            .split_whitespace()
            .chain(query.split_whitespace())
            .map(str::to_lowercase)
            .collect();
        let category = filter.category.as_ref().map(|category| match category {
            CategoryFilter::Uncategorized => CategoryFilter::Uncategorized,
            CategoryFilter::Named(name) => CategoryFilter::Named(name.trim().to_lowercase()),
        });

        Ok(Self {
            completed: filter.completed,
            category,
            priority: filter.priority,
            tag: filter.tag.as_ref().map(|tag| tag.trim().to_lowercase()),
            due: filter.due,
            tokens,
        })
    }

    /// Compiles a free-text query with no other predicates.
    #[must_use]
    pub fn search(query: &str) -> Self {
        Self {
            completed: None,
            category: None,
            priority: None,
            tag: None,
            due: None,
            tokens: query.split_whitespace().map(str::to_lowercase).collect(),
        }
    }

    /// Returns `true` when the task satisfies every predicate.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_completion(task)
            && self.matches_category(task)
            && self.priority.is_none_or(|priority| task.priority() == priority)
            && self.matches_tag(task)
            && self.matches_due(task)
            && self.matches_text(task)
    }

    /// Keeps the tasks that satisfy every predicate, preserving order.
    #[must_use]
    pub fn apply<'a, I>(&self, tasks: I) -> Vec<Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        tasks
            .into_iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect()
    }

    fn matches_completion(&self, task: &Task) -> bool {
        self.completed
            .is_none_or(|completed| task.completed() == completed)
    }

    fn matches_category(&self, task: &Task) -> bool {
        match &self.category {
            None => true,
            Some(CategoryFilter::Uncategorized) => task.category().is_none(),
            Some(CategoryFilter::Named(name)) => task
                .category()
                .is_some_and(|category| category.to_lowercase() == *name),
        }
    }

    fn matches_tag(&self, task: &Task) -> bool {
        self.tag.as_ref().is_none_or(|wanted| {
            task.tags()
                .iter()
                .any(|tag| tag.to_lowercase() == *wanted)
        })
    }

    fn matches_due(&self, task: &Task) -> bool {
        self.due.as_ref().is_none_or(|range| {
            task.due_date()
                .is_some_and(|due| range.contains(due))
        })
    }

    fn matches_text(&self, task: &Task) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let title = task.title().to_lowercase();
        let description = task.description().to_lowercase();
        let tags: Vec<String> = task.tags().iter().map(|tag| tag.to_lowercase()).collect();

        self.tokens.iter().all(|token| {
            title.contains(token.as_str())
                || description.contains(token.as_str())
                || tags.iter().any(|tag| tag.contains(token.as_str()))
        })
    }
}

/// Evaluates one task against a filter and an extra free-text query.
///
/// # Errors
///
/// Returns [`ValidationError::InvertedDateRange`] for a reversed window.
pub fn matches(task: &Task, filter: &FilterState, query: &str) -> Result<bool, ValidationError> {
    Ok(TaskMatcher::new(filter, query)?.matches(task))
}

/// Field used to order task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Creation timestamp.
    #[default]
    CreatedAt,
    /// Modification timestamp.
    UpdatedAt,
    /// Due date; undated tasks always come last.
    DueDate,
    /// Priority ordinal.
    Priority,
    /// Title, compared case-insensitively.
    Title,
}

/// Ordering direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    #[default]
    Descending,
}

impl SortDirection {
    const fn orient(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Sort field and direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    /// Field to compare.
    pub field: SortField,
    /// Direction of the comparison.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort specification.
    #[must_use]
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Compares two tasks, breaking ties on id ascending.
    #[must_use]
    pub fn compare(self, left: &Task, right: &Task) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => self
                .direction
                .orient(left.created_at().cmp(&right.created_at())),
            SortField::UpdatedAt => self
                .direction
                .orient(left.updated_at().cmp(&right.updated_at())),
            SortField::Priority => self.direction.orient(left.priority().cmp(&right.priority())),
            SortField::Title => self.direction.orient(
                left.title()
                    .to_lowercase()
                    .cmp(&right.title().to_lowercase()),
            ),
            SortField::DueDate => match (left.due_date(), right.due_date()) {
                (Some(lhs), Some(rhs)) => self.direction.orient(lhs.cmp(&rhs)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        primary.then_with(|| left.id().cmp(&right.id()))
    }
}

/// Sorts tasks in place.
pub fn sort_tasks(tasks: &mut [Task], spec: SortSpec) {
    tasks.sort_by(|left, right| spec.compare(left, right));
}
