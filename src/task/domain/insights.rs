//! Derived views over the task collection.

use super::Task;
use std::collections::BTreeMap;

/// Task counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    /// Low-priority tasks.
    pub low: usize,
    /// Medium-priority tasks.
    pub medium: usize,
    /// High-priority tasks.
    pub high: usize,
}

/// Aggregate counters over the full collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStatistics {
    /// Number of tasks.
    pub total: usize,
    /// Completed tasks.
    pub completed: usize,
    /// Open tasks.
    pub pending: usize,
    /// Open tasks whose due date has passed.
    pub overdue: usize,
    /// Counts per priority.
    pub by_priority: PriorityCounts,
    /// Counts per category name.
    pub by_category: BTreeMap<String, usize>,
    /// Tasks without a category.
    pub uncategorized: usize,
    /// Completed share of the total, rounded down. Zero for an empty collection.
    pub completion_rate_percent: u8,
}

/// Position of one task in a filtered, sorted sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNavigationContext {
    /// The focused task.
    pub task: Task,
    /// Zero-based index in the sequence.
    pub position: usize,
    /// Length of the sequence.
    pub total: usize,
    /// Preceding neighbour.
    pub previous: Option<Task>,
    /// Following neighbour.
    pub next: Option<Task>,
    /// Tasks sharing the category or a tag.
    pub related: Vec<Task>,
}

impl TaskNavigationContext {
    /// Returns `true` when a preceding task exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Returns `true` when a following task exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}
