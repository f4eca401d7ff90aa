//! Transient multi-select state for bulk actions.

use super::bulk::BulkOutcome;
use crate::task::{
    config::MAX_BULK_ITEMS,
    domain::TaskId,
    ports::BulkOperationKind,
};
use std::collections::HashSet;

/// Ordered set of selected task ids, capped at a fixed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSelection {
    ids: Vec<TaskId>,
    capacity: usize,
}

impl Default for BulkSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkSelection {
    /// Creates an empty selection holding at most [`MAX_BULK_ITEMS`] ids.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_capacity(MAX_BULK_ITEMS)
    }

    /// Creates an empty selection with a smaller cap.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        let cap = if capacity > MAX_BULK_ITEMS {
            MAX_BULK_ITEMS
        } else {
            capacity
        };
        Self {
            ids: Vec::new(),
            capacity: cap,
        }
    }

    /// Adds an id. Returns `false` when the selection is full; selecting an
    /// id already present succeeds without change.
    pub fn select(&mut self, id: TaskId) -> bool {
        if self.contains(id) {
            return true;
        }
        if self.ids.len() >= self.capacity {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Removes an id. Returns whether it was selected.
    pub fn deselect(&mut self, id: TaskId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| *selected != id);
        self.ids.len() != before
    }

    /// Flips an id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: TaskId) -> bool {
        if self.deselect(id) {
            false
        } else {
            self.select(id)
        }
    }

    /// Replaces the selection with the first distinct ids that fit and
    /// returns how many were left out.
    pub fn select_all<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = TaskId>,
    {
        self.ids.clear();
        let mut seen = HashSet::new();
        let mut dropped = 0;
        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            if self.ids.len() < self.capacity {
                self.ids.push(id);
            } else {
                dropped += 1;
            }
        }
        dropped
    }

    /// Removes every id.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Returns `true` when `id` is selected.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns the selected ids in selection order.
    #[must_use]
    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }

    /// Returns the number of selected ids.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when nothing is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the cap.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops ids that no longer refer to a live task after a bulk request:
    /// every missing id, and every removed id for deletions.
    pub fn reconcile(&mut self, outcome: &BulkOutcome) {
        let deleted = matches!(outcome.kind, BulkOperationKind::Delete);
        self.ids.retain(|id| {
            !outcome.missing.contains(id) && !(deleted && outcome.succeeded.contains(id))
        });
    }
}
