//! Authoritative in-memory task collection backed by durable storage.
//!
//! Every mutation runs against a draft of the collection, persists the
//! whole draft, and only then publishes it. A storage failure therefore
//! leaves both the published snapshot and the durable store at their
//! previous value.
//!
//! A save that outlives `storage_timeout` keeps running with the write gate
//! held. The caller sees a retryable timeout; the collection is published
//! afterwards only if that save lands.

use super::snapshot::{SnapshotCell, SnapshotLease, SnapshotWriter, persist_detached};
use crate::task::{
    domain::{Category, FieldPatch, NewTask, Task, TaskId, TaskUpdate, ValidationError},
    ports::{StorageAdapter, StorageError, StorageResult},
};
use mockable::Clock;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned by repository operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Input was rejected before anything changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The durable store rejected the change.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Tasks changed by a batch update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchUpdate {
    /// Updated tasks in request order.
    pub updated: Vec<Task>,
    /// Requested ids that were not in the collection.
    pub missing: Vec<TaskId>,
}

/// Runs a storage read, failing with a retryable timeout error after `limit`.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        warn!(timeout_ms = limit.as_millis(), "storage call timed out");
        Err(StorageError::timeout(limit))
    })
}

/// Task collection with draft-then-persist mutation semantics.
pub struct TaskRepository<S, C>
where
    S: StorageAdapter,
    C: Clock + Send + Sync,
{
    storage: Arc<S>,
    clock: Arc<C>,
    tasks: SnapshotCell<Vec<Task>>,
    storage_timeout: Duration,
}

impl<S, C> TaskRepository<S, C>
where
    S: StorageAdapter,
    C: Clock + Send + Sync,
{
    /// Creates an empty repository. Call [`Self::load`] to read stored tasks.
    #[must_use]
    pub fn new(storage: Arc<S>, clock: Arc<C>, storage_timeout: Duration) -> Self {
        Self {
            storage,
            clock,
            tasks: SnapshotCell::new(Vec::new()),
            storage_timeout,
        }
    }

    /// Replaces the collection with the stored tasks.
    ///
    /// Records repeating an identifier already seen are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Storage`] when the store cannot be read.
    pub async fn load(&self) -> TaskRepositoryResult<usize> {
        let mut writer = self.tasks.begin().await;
        let stored = bounded(self.storage_timeout, self.storage.load_tasks()).await?;
        let mut seen = HashSet::with_capacity(stored.len());
        let unique: Vec<Task> = stored
            .into_iter()
            .filter(|task| {
                let first = seen.insert(task.id());
                if !first {
                    warn!(task_id = %task.id(), "dropping duplicate stored task");
                }
                first
            })
            .collect();
        let count = unique.len();
        *writer.draft_mut() = unique;
        writer.commit().await;
        debug!(count, "loaded task collection");
        Ok(count)
    }

    /// Returns the current collection.
    pub async fn list(&self) -> Arc<Vec<Task>> {
        self.tasks.snapshot().await
    }

    /// Returns a task by identifier.
    pub async fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks
            .snapshot()
            .await
            .iter()
            .find(|task| task.id() == id)
            .cloned()
    }

    /// Creates and stores a task with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Validation`] for a blank title or tag
    /// and [`TaskRepositoryError::Storage`] when persistence fails.
    pub async fn create(&self, new_task: NewTask) -> TaskRepositoryResult<Task> {
        let task = Task::create(new_task, &*self.clock)?;
        let mut writer = self.tasks.begin().await;
        writer.draft_mut().push(task.clone());
        self.persist(writer).await?;
        Ok(task)
    }

    /// Merges `update` into a task and refreshes its modification time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for an unknown id,
    /// [`TaskRepositoryError::Validation`] for rejected fields and
    /// [`TaskRepositoryError::Storage`] when persistence fails.
    pub async fn update(&self, id: TaskId, update: &TaskUpdate) -> TaskRepositoryResult<Task> {
        let (task, _) = self.merge(id, |_| update.clone(), true).await?;
        Ok(task)
    }

    /// Like [`Self::update`], with the update derived from the current task
    /// while the write gate is held.
    ///
    /// # Errors
    ///
    /// As for [`Self::update`].
    pub async fn update_with<F>(&self, id: TaskId, build: F) -> TaskRepositoryResult<Task>
    where
        F: FnOnce(&Task) -> TaskUpdate + Send,
    {
        let (task, _) = self.merge(id, build, true).await?;
        Ok(task)
    }

    /// Like [`Self::update`], but leaves the task and the store untouched
    /// when the merge changes nothing. Returns the task and whether it
    /// changed.
    ///
    /// # Errors
    ///
    /// As for [`Self::update`].
    pub async fn update_if_changed(
        &self,
        id: TaskId,
        update: &TaskUpdate,
    ) -> TaskRepositoryResult<(Task, bool)> {
        self.merge(id, |_| update.clone(), false).await
    }

    /// Removes a task and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for an unknown id and
    /// [`TaskRepositoryError::Storage`] when persistence fails.
    pub async fn delete(&self, id: TaskId) -> TaskRepositoryResult<Task> {
        let mut writer = self.tasks.begin().await;
        let position = position_of(writer.draft(), id)?;
        let removed = writer.draft_mut().remove(position);
        self.persist(writer).await?;
        Ok(removed)
    }

    /// Removes every listed task that exists and returns the removed ids.
    ///
    /// Unknown ids are skipped. Nothing is persisted when no id matched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Storage`] when persistence fails.
    pub async fn delete_many(&self, ids: &[TaskId]) -> TaskRepositoryResult<Vec<TaskId>> {
        let targets: HashSet<TaskId> = ids.iter().copied().collect();
        let mut writer = self.tasks.begin().await;
        let mut removed = Vec::new();
        writer.draft_mut().retain(|task| {
            let remove = targets.contains(&task.id());
            if remove {
                removed.push(task.id());
            }
            !remove
        });
        if removed.is_empty() {
            return Ok(removed);
        }
        self.persist(writer).await?;
        Ok(removed)
    }

    /// Applies one update to every listed task that exists, persisting the
    /// whole batch once.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Validation`] when the update is
    /// rejected for any task, in which case nothing changes, and
    /// [`TaskRepositoryError::Storage`] when persistence fails.
    pub async fn apply_batch(
        &self,
        ids: &[TaskId],
        update: &TaskUpdate,
    ) -> TaskRepositoryResult<BatchUpdate> {
        let mut writer = self.tasks.begin().await;
        let mut outcome = BatchUpdate::default();
        for &id in ids {
            let Some(task) = writer.draft_mut().iter_mut().find(|task| task.id() == id) else {
                outcome.missing.push(id);
                continue;
            };
            task.apply(update)?;
            task.touch(&*self.clock);
            outcome.updated.push(task.clone());
        }
        if outcome.updated.is_empty() {
            return Ok(outcome);
        }
        self.persist(writer).await?;
        Ok(outcome)
    }

    /// Detaches `name` from every task and saves the tasks together with
    /// `catalogue` in one write. Both are published only if it lands.
    pub(crate) async fn remove_category(
        &self,
        name: &str,
        catalogue: SnapshotWriter<Vec<Category>>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let mut writer = self.tasks.begin().await;
        let detached = detach_in(writer.draft_mut(), name, &*self.clock)?;
        let storage = Arc::clone(&self.storage);
        let tasks = writer.draft().clone();
        let categories = catalogue.draft().clone();
        persist_detached(
            self.storage_timeout,
            (writer, catalogue),
            async move { storage.save_catalogue(&tasks, &categories).await },
            |(task_writer, category_writer)| async move {
                task_writer.commit().await;
                category_writer.commit().await;
            },
        )
        .await?;
        Ok(detached)
    }

    /// Waits for the write gate and returns the collection. Mutations wait
    /// until the lease is dropped.
    pub(crate) async fn hold(&self) -> SnapshotLease<'_, Vec<Task>> {
        self.tasks.hold().await
    }

    /// Removes every stored record and empties the collection.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Storage`] when the store cannot be
    /// cleared; the collection is then left as it was.
    pub async fn clear(&self) -> TaskRepositoryResult<()> {
        self.clear_with((), |()| std::future::ready(())).await?;
        Ok(())
    }

    /// Clears storage, then empties the collection and runs `reset` on
    /// `companions` once the clear has landed. Returns the removed ids.
    pub(crate) async fn clear_with<W, R, F>(
        &self,
        companions: W,
        reset: R,
    ) -> TaskRepositoryResult<Vec<TaskId>>
    where
        W: Send + 'static,
        R: FnOnce(W) -> F + Send + 'static,
        F: Future<Output = ()> + Send,
    {
        let mut writer = self.tasks.begin().await;
        let removed: Vec<TaskId> = writer.draft().iter().map(Task::id).collect();
        writer.draft_mut().clear();
        let storage = Arc::clone(&self.storage);
        persist_detached(
            self.storage_timeout,
            (writer, companions),
            async move { storage.clear_all_data().await },
            |(task_writer, held)| async move {
                task_writer.commit().await;
                reset(held).await;
            },
        )
        .await?;
        Ok(removed)
    }

    async fn merge<F>(
        &self,
        id: TaskId,
        build: F,
        always_touch: bool,
    ) -> TaskRepositoryResult<(Task, bool)>
    where
        F: FnOnce(&Task) -> TaskUpdate + Send,
    {
        let mut writer = self.tasks.begin().await;
        let position = position_of(writer.draft(), id)?;
        let task = writer
            .draft_mut()
            .get_mut(position)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        let update = build(task);
        let changed = task.apply(&update)?;
        if !changed && !always_touch {
            return Ok((task.clone(), false));
        }
        task.touch(&*self.clock);
        let updated = task.clone();
        self.persist(writer).await?;
        Ok((updated, changed))
    }

    async fn persist(&self, writer: SnapshotWriter<Vec<Task>>) -> TaskRepositoryResult<()> {
        let storage = Arc::clone(&self.storage);
        let draft = writer.draft().clone();
        writer
            .persist(self.storage_timeout, async move {
                storage.save_tasks(&draft).await
            })
            .await?;
        Ok(())
    }
}

/// Counts tasks whose category is `name`, compared case-insensitively.
pub(crate) fn count_in_category(tasks: &[Task], name: &str) -> usize {
    let wanted = name.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            task.category()
                .is_some_and(|category| category.to_lowercase() == wanted)
        })
        .count()
}

fn detach_in<C: Clock>(
    tasks: &mut [Task],
    name: &str,
    clock: &C,
) -> Result<Vec<Task>, ValidationError> {
    let wanted = name.trim().to_lowercase();
    let update = TaskUpdate {
        category: Some(FieldPatch::Clear),
        ..TaskUpdate::default()
    };
    let mut detached = Vec::new();
    for task in tasks.iter_mut() {
        if task
            .category()
            .is_some_and(|category| category.to_lowercase() == wanted)
        {
            task.apply(&update)?;
            task.touch(clock);
            detached.push(task.clone());
        }
    }
    Ok(detached)
}

fn position_of(tasks: &[Task], id: TaskId) -> TaskRepositoryResult<usize> {
    tasks
        .iter()
        .position(|task| task.id() == id)
        .ok_or(TaskRepositoryError::NotFound(id))
}
