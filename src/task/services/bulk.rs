//! Bulk operations over a bounded set of tasks.

use super::repository::{TaskRepository, TaskRepositoryResult};
use crate::task::{
    config::MAX_BULK_ITEMS,
    domain::{Priority, Task, TaskId, TaskUpdate, ValidationError},
    ports::{BulkOperationKind, StorageAdapter},
};
use mockable::Clock;
use std::collections::HashSet;
use tracing::info;

/// Change applied to every task of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOperation {
    /// Remove the tasks.
    Delete,
    /// Set the completion flag.
    SetCompletion(bool),
    /// Set or clear the category reference.
    SetCategory(Option<String>),
    /// Set the priority.
    SetPriority(Priority),
    /// Merge a general update.
    Update(TaskUpdate),
}

impl BulkOperation {
    /// Returns the event discriminator for this operation.
    #[must_use]
    pub const fn kind(&self) -> BulkOperationKind {
        match self {
            Self::Delete => BulkOperationKind::Delete,
            Self::SetCompletion(_) => BulkOperationKind::SetCompletion,
            Self::SetCategory(_) => BulkOperationKind::SetCategory,
            Self::SetPriority(_) => BulkOperationKind::SetPriority,
            Self::Update(_) => BulkOperationKind::Update,
        }
    }

    /// Checks the payload before any task is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank title, tag or category name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Update(update) => update.validate(),
            Self::SetCategory(Some(name)) if name.trim().is_empty() => {
                Err(ValidationError::EmptyCategoryName)
            }
            _ => Ok(()),
        }
    }

    fn as_update(&self) -> Option<TaskUpdate> {
        match self {
            Self::Delete => None,
            Self::SetCompletion(completed) => Some(TaskUpdate::new().completed(*completed)),
            Self::SetCategory(category) => Some(TaskUpdate::new().category(category.clone())),
            Self::SetPriority(priority) => Some(TaskUpdate::new().priority(*priority)),
            Self::Update(update) => Some(update.clone()),
        }
    }
}

/// Result of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    /// What was applied.
    pub kind: BulkOperationKind,
    /// Ids that were changed or removed.
    pub succeeded: Vec<TaskId>,
    /// Ids that were not in the collection.
    pub missing: Vec<TaskId>,
    /// Updated tasks; empty for deletions.
    pub tasks: Vec<Task>,
}

impl BulkOutcome {
    /// Creates an outcome that touched nothing.
    #[must_use]
    pub const fn empty(kind: BulkOperationKind) -> Self {
        Self {
            kind,
            succeeded: Vec::new(),
            missing: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Returns `true` when no task changed.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.succeeded.is_empty()
    }
}

/// Enforces bulk limits and applies bulk operations through the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkCoordinator {
    max_items: usize,
}

impl Default for BulkCoordinator {
    fn default() -> Self {
        Self::new(MAX_BULK_ITEMS)
    }
}

impl BulkCoordinator {
    /// Creates a coordinator. Limits above [`MAX_BULK_ITEMS`] are clamped.
    #[must_use]
    pub const fn new(max_items: usize) -> Self {
        let limit = if max_items > MAX_BULK_ITEMS {
            MAX_BULK_ITEMS
        } else {
            max_items
        };
        Self { max_items: limit }
    }

    /// Returns the effective limit.
    #[must_use]
    pub const fn max_items(&self) -> usize {
        self.max_items
    }

    /// Deduplicates `ids`, keeping first-seen order, and enforces the limit.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BulkLimitExceeded`] when more distinct ids
    /// than the limit are named.
    pub fn prepare(&self, ids: &[TaskId]) -> Result<Vec<TaskId>, ValidationError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let distinct: Vec<TaskId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if distinct.len() > self.max_items {
            return Err(ValidationError::BulkLimitExceeded {
                max: self.max_items,
                actual: distinct.len(),
            });
        }
        Ok(distinct)
    }

    /// Validates and applies `operation` to `ids`.
    ///
    /// The whole batch is persisted once. On any error nothing changes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an oversized request or a rejected
    /// payload, and a storage error when persistence fails.
    pub async fn execute<S, C>(
        &self,
        repository: &TaskRepository<S, C>,
        ids: &[TaskId],
        operation: &BulkOperation,
    ) -> TaskRepositoryResult<BulkOutcome>
    where
        S: StorageAdapter,
        C: Clock + Send + Sync,
    {
        let distinct = self.prepare(ids)?;
        operation.validate()?;
        let kind = operation.kind();
        if distinct.is_empty() {
            return Ok(BulkOutcome::empty(kind));
        }

        let outcome = match operation.as_update() {
            None => {
                let removed = repository.delete_many(&distinct).await?;
                let missing = distinct
                    .iter()
                    .copied()
                    .filter(|id| !removed.contains(id))
                    .collect();
                BulkOutcome {
                    kind,
                    succeeded: removed,
                    missing,
                    tasks: Vec::new(),
                }
            }
            Some(update) => {
                let batch = repository.apply_batch(&distinct, &update).await?;
                BulkOutcome {
                    kind,
                    succeeded: batch.updated.iter().map(Task::id).collect(),
                    missing: batch.missing,
                    tasks: batch.updated,
                }
            }
        };
        info!(
            operation = kind.as_str(),
            succeeded = outcome.succeeded.len(),
            missing = outcome.missing.len(),
            "bulk operation applied"
        );
        Ok(outcome)
    }
}
