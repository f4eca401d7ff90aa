//! Statistics and navigation derived from the task collection.
//!
//! Everything is recomputed from the collection on each call; nothing is
//! cached between mutations.

use crate::task::domain::{
    FilterState, NotFoundError, Priority, SortSpec, Task, TaskId, TaskMatcher,
    TaskNavigationContext, TaskStatistics, ValidationError, sort_tasks,
};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use thiserror::Error;

/// Default number of entries returned by [`recent_tasks`].
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Errors returned while building a navigation context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The filter is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The task is not part of the filtered sequence.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

/// Computes aggregate counters over `tasks`.
#[must_use]
pub fn task_statistics(tasks: &[Task], now: DateTime<Utc>) -> TaskStatistics {
    let mut stats = TaskStatistics {
        total: tasks.len(),
        ..TaskStatistics::default()
    };
    for task in tasks {
        if task.completed() {
            stats.completed += 1;
        } else {
            stats.pending += 1;
        }
        if task.is_overdue(now) {
            stats.overdue += 1;
        }
        match task.priority() {
            Priority::Low => stats.by_priority.low += 1,
            Priority::Medium => stats.by_priority.medium += 1,
            Priority::High => stats.by_priority.high += 1,
        }
        match task.category() {
            Some(category) => *stats.by_category.entry(category.to_owned()).or_default() += 1,
            None => stats.uncategorized += 1,
        }
    }
    stats.completion_rate_percent = completion_rate(stats.completed, stats.total);
    stats
}

fn completion_rate(completed: usize, total: usize) -> u8 {
    completed
        .saturating_mul(100)
        .checked_div(total)
        .and_then(|rate| u8::try_from(rate).ok())
        .unwrap_or(0)
}

/// Returns up to `limit` tasks, newest first by creation time.
#[must_use]
pub fn recent_tasks(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut recent = tasks.to_vec();
    recent.sort_by_key(|task| (Reverse(task.created_at()), task.id()));
    recent.truncate(limit);
    recent
}

/// Returns the tasks sharing the category or a tag with `task`.
///
/// Ordered by number of shared tags, then most recently updated, then id.
#[must_use]
pub fn related_tasks(tasks: &[Task], task: &Task) -> Vec<Task> {
    let category = task.category().map(str::to_lowercase);
    let tags: BTreeSet<String> = task.tags().iter().map(|tag| tag.to_lowercase()).collect();

    let mut related: Vec<(usize, &Task)> = tasks
        .iter()
        .filter(|candidate| candidate.id() != task.id())
        .filter_map(|candidate| {
            let shared = candidate
                .tags()
                .iter()
                .filter(|tag| tags.contains(&tag.to_lowercase()))
                .count();
            let same_category = category.is_some()
                && candidate.category().map(str::to_lowercase) == category;
            (shared > 0 || same_category).then_some((shared, candidate))
        })
        .collect();
    related.sort_by_key(|(shared, candidate)| {
        (Reverse(*shared), Reverse(candidate.updated_at()), candidate.id())
    });
    related.into_iter().map(|(_, candidate)| candidate.clone()).collect()
}

/// Locates `id` in the filtered, sorted sequence and returns its neighbours.
///
/// # Errors
///
/// Returns [`NavigationError::Validation`] for a malformed filter and
/// [`NavigationError::NotFound`] when the task is absent from the sequence.
pub fn navigation_context(
    tasks: &[Task],
    id: TaskId,
    filter: Option<&FilterState>,
    sort: SortSpec,
) -> Result<TaskNavigationContext, NavigationError> {
    let mut sequence = match filter {
        Some(state) => TaskMatcher::new(state, "")?.apply(tasks),
        None => tasks.to_vec(),
    };
    sort_tasks(&mut sequence, sort);

    let position = sequence
        .iter()
        .position(|task| task.id() == id)
        .ok_or(NotFoundError::Task(id))?;
    let current = sequence
        .get(position)
        .cloned()
        .ok_or(NotFoundError::Task(id))?;
    let previous = position
        .checked_sub(1)
        .and_then(|index| sequence.get(index))
        .cloned();
    let next = sequence.get(position + 1).cloned();
    let related = related_tasks(tasks, &current);

    Ok(TaskNavigationContext {
        task: current,
        position,
        total: sequence.len(),
        previous,
        next,
        related,
    })
}
