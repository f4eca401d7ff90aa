//! Facade over the task catalogue.
//!
//! The service validates requests, delegates mutations to the repository
//! and the bulk coordinator, keeps the category catalogue and preferences,
//! and publishes [`TaskEvent`]s once a change is durable.

use super::aggregator::{self, NavigationError};
use super::bulk::{BulkCoordinator, BulkOperation, BulkOutcome};
use super::repository::{TaskRepository, TaskRepositoryError, bounded, count_in_category};
use super::snapshot::{SnapshotCell, SnapshotLease};
use crate::task::{
    config::{CategoryDeletionPolicy, ConfigError, TaskServiceConfig},
    domain::{
        Category, DataVersion, FieldPatch, FilterState, NewTask, NotFoundError, Priority,
        SortSpec, TagsPatch, Task, TaskId, TaskMatcher, TaskNavigationContext, TaskStatistics,
        TaskUpdate, UserPreferences, ValidationError, normalize_category_name, normalize_tag,
        sort_tasks,
    },
    ports::{BulkOperationKind, StorageAdapter, StorageError, TaskEvent, TaskEventListener},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for task catalogue operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Input was rejected before anything changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced task or category does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The durable store rejected the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The service configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TaskServiceError {
    /// Returns `true` when retrying the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Returns the storage failure, if this is one.
    #[must_use]
    pub const fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskRepositoryError> for TaskServiceError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::NotFound(NotFoundError::Task(id)),
            TaskRepositoryError::Validation(inner) => Self::Validation(inner),
            TaskRepositoryError::Storage(inner) => Self::Storage(inner),
        }
    }
}

impl From<NavigationError> for TaskServiceError {
    fn from(err: NavigationError) -> Self {
        match err {
            NavigationError::Validation(inner) => Self::Validation(inner),
            NavigationError::NotFound(inner) => Self::NotFound(inner),
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Keeps category changes out while a task write that names a category
/// is in progress. Taken before the task gate, never after.
type CatalogueLease<'a> = SnapshotLease<'a, Vec<Category>>;

/// Task catalogue service.
pub struct TaskService<S, C>
where
    S: StorageAdapter,
    C: Clock + Send + Sync,
{
    storage: Arc<S>,
    clock: Arc<C>,
    config: TaskServiceConfig,
    repository: TaskRepository<S, C>,
    bulk: BulkCoordinator,
    categories: SnapshotCell<Vec<Category>>,
    preferences: SnapshotCell<UserPreferences>,
    listeners: RwLock<Vec<Arc<dyn TaskEventListener>>>,
}

impl<S, C> TaskService<S, C>
where
    S: StorageAdapter,
    C: Clock + Send + Sync,
{
    /// Opens the catalogue: checks the store, upgrades its schema to
    /// [`DataVersion::CURRENT`], and loads tasks, categories and preferences.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Config`] for an invalid configuration and
    /// [`TaskServiceError::Storage`] when the store is unavailable, cannot be
    /// migrated, or cannot be read.
    pub async fn open(
        storage: Arc<S>,
        clock: Arc<C>,
        config: TaskServiceConfig,
    ) -> TaskServiceResult<Self> {
        config.validate()?;
        let limit = config.storage_timeout;
        if !storage.is_storage_available().await {
            warn!("storage unavailable while opening task service");
            return Err(StorageError::unavailable("storage is not available").into());
        }

        let stored_version = bounded(limit, storage.data_version()).await?;
        let from = stored_version.unwrap_or(DataVersion::CURRENT);
        bounded(limit, storage.migrate_data(from, DataVersion::CURRENT))
            .await
            .inspect_err(|err| warn!(error = %err, %from, "schema migration failed"))?;

        let repository = TaskRepository::new(Arc::clone(&storage), Arc::clone(&clock), limit);
        let loaded = repository.load().await?;
        let categories = bounded(limit, storage.load_categories()).await?;
        let preferences = bounded(limit, storage.load_preferences()).await?;
        info!(
            tasks = loaded,
            categories = categories.len(),
            version = %DataVersion::CURRENT,
            "task service opened"
        );

        Ok(Self {
            bulk: BulkCoordinator::new(config.max_bulk_items),
            storage,
            clock,
            config,
            repository,
            categories: SnapshotCell::new(categories),
            preferences: SnapshotCell::new(preferences),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &TaskServiceConfig {
        &self.config
    }

    /// Registers a listener for events published after durable changes.
    pub fn subscribe(&self, listener: Arc<dyn TaskEventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    // Tasks

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Validation`] for a blank or overlong title,
    /// a blank tag or an unknown category, and [`TaskServiceError::Storage`]
    /// when persistence fails.
    pub async fn create_task(&self, new_task: NewTask) -> TaskServiceResult<Task> {
        let result = self.try_create_task(new_task).await;
        self.finish("create_task", result, |task| TaskEvent::Created(task.clone()))
    }

    async fn try_create_task(&self, new_task: NewTask) -> TaskServiceResult<Task> {
        self.check_title(new_task.title())?;
        let requested = new_task.category().map(str::to_owned);
        let task = match requested {
            Some(name) => {
                let catalogue = self.categories.hold().await;
                let canonical = resolve_category(catalogue.value(), &name)?;
                let created = self
                    .repository
                    .create(new_task.with_category(canonical))
                    .await?;
                drop(catalogue);
                created
            }
            None => self.repository.create(new_task).await?,
        };
        info!(task_id = %task.id(), "task created");
        Ok(task)
    }

    /// Merges the present fields of `update` into a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for an unknown id,
    /// [`TaskServiceError::Validation`] for rejected fields and
    /// [`TaskServiceError::Storage`] when persistence fails.
    pub async fn update_task(&self, id: TaskId, update: TaskUpdate) -> TaskServiceResult<Task> {
        let result: TaskServiceResult<Task> = async {
            let (prepared, _catalogue) = self.prepare_update(update).await?;
            Ok(self.repository.update(id, &prepared).await?)
        }
        .await;
        self.finish("update_task", result, updated_event)
    }

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for an unknown id and
    /// [`TaskServiceError::Storage`] when persistence fails.
    pub async fn delete_task(&self, id: TaskId) -> TaskServiceResult<()> {
        let result = self
            .repository
            .delete(id)
            .await
            .map(|task| task.id())
            .map_err(TaskServiceError::from);
        self.finish("delete_task", result, |removed| TaskEvent::Deleted(*removed))
            .map(|_| ())
    }

    /// Removes the listed tasks, skipping unknown ids.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BulkLimitExceeded`] for too many ids and
    /// [`TaskServiceError::Storage`] when persistence fails.
    pub async fn delete_multiple_tasks(&self, ids: &[TaskId]) -> TaskServiceResult<BulkOutcome> {
        self.run_bulk(ids, BulkOperation::Delete).await
    }

    /// Returns every task, ordered by the preferred sort.
    pub async fn tasks(&self) -> Vec<Task> {
        let sort = self.default_sort().await;
        let mut tasks = self.repository.list().await.to_vec();
        sort_tasks(&mut tasks, sort);
        tasks
    }

    /// Returns one task.
    pub async fn task(&self, id: TaskId) -> Option<Task> {
        self.repository.get(id).await
    }

    /// Returns tasks matching every whitespace-separated token of `query` in
    /// their title, description or tags, ordered by the preferred sort.
    pub async fn search_tasks(&self, query: &str) -> Vec<Task> {
        let sort = self.default_sort().await;
        self.select(&TaskMatcher::search(query), sort).await
    }

    /// Returns tasks matching `filter`, ordered by the preferred sort.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedDateRange`] for a malformed filter.
    pub async fn filter_tasks(&self, filter: &FilterState) -> TaskServiceResult<Vec<Task>> {
        let matcher = TaskMatcher::new(filter, "")?;
        let sort = self.default_sort().await;
        Ok(self.select(&matcher, sort).await)
    }

    /// Returns tasks matching `filter` in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedDateRange`] for a malformed filter.
    pub async fn query_tasks(
        &self,
        filter: &FilterState,
        sort: SortSpec,
    ) -> TaskServiceResult<Vec<Task>> {
        let matcher = TaskMatcher::new(filter, "")?;
        Ok(self.select(&matcher, sort).await)
    }

    /// Flips the completion flag of a task.
    ///
    /// # Errors
    ///
    /// As for [`Self::update_task`].
    pub async fn toggle_task_completion(&self, id: TaskId) -> TaskServiceResult<Task> {
        let result = self
            .repository
            .update_with(id, |task| TaskUpdate::new().completed(!task.completed()))
            .await
            .map_err(TaskServiceError::from);
        self.finish("toggle_task_completion", result, updated_event)
    }

    /// Sets the completion flag on the listed tasks.
    ///
    /// # Errors
    ///
    /// As for [`Self::delete_multiple_tasks`].
    pub async fn bulk_toggle_completion(
        &self,
        ids: &[TaskId],
        completed: bool,
    ) -> TaskServiceResult<BulkOutcome> {
        self.run_bulk(ids, BulkOperation::SetCompletion(completed))
            .await
    }

    /// Sets or clears the category of a task.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownCategory`] when the category is not
    /// in the catalogue, otherwise as for [`Self::update_task`].
    pub async fn set_task_category(
        &self,
        id: TaskId,
        category: Option<String>,
    ) -> TaskServiceResult<Task> {
        self.update_task(id, TaskUpdate::new().category(category))
            .await
    }

    /// Adds a tag. Adding a tag the task already has changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTag`] for a blank tag, otherwise as
    /// for [`Self::update_task`].
    pub async fn add_task_tag(&self, id: TaskId, tag: &str) -> TaskServiceResult<Task> {
        self.patch_tags(id, tag, TagsPatch::Add, "add_task_tag").await
    }

    /// Removes a tag. Removing a tag the task lacks changes nothing.
    ///
    /// # Errors
    ///
    /// As for [`Self::add_task_tag`].
    pub async fn remove_task_tag(&self, id: TaskId, tag: &str) -> TaskServiceResult<Task> {
        self.patch_tags(id, tag, TagsPatch::Remove, "remove_task_tag")
            .await
    }

    /// Sets the priority of a task.
    ///
    /// # Errors
    ///
    /// As for [`Self::update_task`].
    pub async fn set_task_priority(
        &self,
        id: TaskId,
        priority: Priority,
    ) -> TaskServiceResult<Task> {
        self.update_task(id, TaskUpdate::new().priority(priority))
            .await
    }

    /// Sets or clears the due date of a task.
    ///
    /// # Errors
    ///
    /// As for [`Self::update_task`].
    pub async fn set_task_due_date(
        &self,
        id: TaskId,
        due_date: Option<DateTime<Utc>>,
    ) -> TaskServiceResult<Task> {
        self.update_task(id, TaskUpdate::new().due_date(due_date))
            .await
    }

    /// Merges one update into every listed task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Validation`] for too many ids or a
    /// rejected update, and [`TaskServiceError::Storage`] when persistence
    /// fails. Nothing changes on error.
    pub async fn bulk_update_tasks(
        &self,
        ids: &[TaskId],
        update: TaskUpdate,
    ) -> TaskServiceResult<BulkOutcome> {
        match self.prepare_update(update).await {
            Ok((prepared, _catalogue)) => {
                self.run_bulk(ids, BulkOperation::Update(prepared)).await
            }
            Err(err) => {
                warn!(operation = "bulk_update_tasks", error = %err, "bulk request rejected");
                Err(err)
            }
        }
    }

    /// Sets or clears the category of every listed task.
    ///
    /// # Errors
    ///
    /// As for [`Self::bulk_update_tasks`].
    pub async fn bulk_set_category(
        &self,
        ids: &[TaskId],
        category: Option<String>,
    ) -> TaskServiceResult<BulkOutcome> {
        let (resolved, _catalogue) = match category {
            Some(name) => {
                let catalogue = self.categories.hold().await;
                match resolve_category(catalogue.value(), &name) {
                    Ok(canonical) => (Some(canonical), Some(catalogue)),
                    Err(err) => {
                        warn!(operation = "bulk_set_category", error = %err, "bulk request rejected");
                        return Err(err.into());
                    }
                }
            }
            None => (None, None),
        };
        self.run_bulk(ids, BulkOperation::SetCategory(resolved))
            .await
    }

    /// Sets the priority of every listed task.
    ///
    /// # Errors
    ///
    /// As for [`Self::delete_multiple_tasks`].
    pub async fn bulk_set_priority(
        &self,
        ids: &[TaskId],
        priority: Priority,
    ) -> TaskServiceResult<BulkOutcome> {
        self.run_bulk(ids, BulkOperation::SetPriority(priority))
            .await
    }

    // Insights

    /// Returns counters over the full collection as of now.
    pub async fn task_statistics(&self) -> TaskStatistics {
        let tasks = self.repository.list().await;
        aggregator::task_statistics(&tasks, self.clock.utc())
    }

    /// Returns the most recently created tasks. `None` uses the configured
    /// default.
    pub async fn recent_tasks(&self, limit: Option<usize>) -> Vec<Task> {
        let tasks = self.repository.list().await;
        aggregator::recent_tasks(&tasks, limit.unwrap_or(self.config.recent_tasks_limit))
    }

    /// Returns the tasks sharing the category or a tag with a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for an unknown id.
    pub async fn related_tasks(&self, id: TaskId) -> TaskServiceResult<Vec<Task>> {
        let tasks = self.repository.list().await;
        let task = tasks
            .iter()
            .find(|task| task.id() == id)
            .ok_or(NotFoundError::Task(id))?;
        Ok(aggregator::related_tasks(&tasks, task))
    }

    /// Returns the position and neighbours of a task within the filtered
    /// collection, ordered by the preferred sort.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task is not part of
    /// the filtered collection and [`TaskServiceError::Validation`] for a
    /// malformed filter.
    pub async fn task_navigation_context(
        &self,
        id: TaskId,
        filter: Option<&FilterState>,
    ) -> TaskServiceResult<TaskNavigationContext> {
        let sort = self.default_sort().await;
        let tasks = self.repository.list().await;
        Ok(aggregator::navigation_context(&tasks, id, filter, sort)?)
    }

    // Categories

    /// Returns the category catalogue.
    pub async fn categories(&self) -> Vec<Category> {
        self.categories.snapshot().await.to_vec()
    }

    /// Adds a category.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCategoryName`] or
    /// [`ValidationError::DuplicateCategory`] for a rejected name and
    /// [`TaskServiceError::Storage`] when persistence fails.
    pub async fn create_category(
        &self,
        name: &str,
        color: Option<String>,
    ) -> TaskServiceResult<Category> {
        let result = self.try_create_category(name, color).await;
        match &result {
            Ok(category) => info!(category = category.name(), "category created"),
            Err(err) => warn!(operation = "create_category", error = %err, "category rejected"),
        }
        result
    }

    async fn try_create_category(
        &self,
        name: &str,
        color: Option<String>,
    ) -> TaskServiceResult<Category> {
        let normalized = normalize_category_name(name)?;
        let mut writer = self.categories.begin().await;
        if writer
            .draft()
            .iter()
            .any(|existing| existing.is_named(&normalized))
        {
            return Err(ValidationError::DuplicateCategory(normalized).into());
        }
        let category = Category::new(&normalized, color, &*self.clock)?;
        writer.draft_mut().push(category.clone());
        let storage = Arc::clone(&self.storage);
        let catalogue = writer.draft().clone();
        writer
            .persist(self.config.storage_timeout, async move {
                storage.save_categories(&catalogue).await
            })
            .await?;
        Ok(category)
    }

    /// Removes a category according to the configured
    /// [`CategoryDeletionPolicy`].
    ///
    /// With [`CategoryDeletionPolicy::Detach`] referencing tasks lose their
    /// category in the same write that removes it, announced by one bulk
    /// event once that write has landed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for an unknown category,
    /// [`ValidationError::CategoryInUse`] under the reject policy, and
    /// [`TaskServiceError::Storage`] when persistence fails.
    pub async fn delete_category(&self, name: &str) -> TaskServiceResult<()> {
        match self.try_delete_category(name).await {
            Ok(detached) => {
                info!(category = name, detached = detached.len(), "category deleted");
                if !detached.is_empty() {
                    self.publish(&TaskEvent::BulkOperation {
                        kind: BulkOperationKind::SetCategory,
                        affected: detached,
                    });
                }
                Ok(())
            }
            Err(err) => {
                warn!(operation = "delete_category", error = %err, "category not deleted");
                Err(err)
            }
        }
    }

    async fn try_delete_category(&self, name: &str) -> TaskServiceResult<Vec<TaskId>> {
        let mut writer = self.categories.begin().await;
        let position = writer
            .draft()
            .iter()
            .position(|category| category.is_named(name))
            .ok_or_else(|| NotFoundError::Category(name.trim().to_owned()))?;
        writer.draft_mut().remove(position);

        match self.config.category_deletion {
            CategoryDeletionPolicy::Reject => {
                let tasks = self.repository.hold().await;
                let in_use = count_in_category(tasks.value(), name);
                if in_use > 0 {
                    return Err(ValidationError::CategoryInUse {
                        name: name.trim().to_owned(),
                        tasks: in_use,
                    }
                    .into());
                }
                let storage = Arc::clone(&self.storage);
                let remaining = writer.draft().clone();
                writer
                    .persist(self.config.storage_timeout, async move {
                        storage.save_categories(&remaining).await
                    })
                    .await?;
                drop(tasks);
                Ok(Vec::new())
            }
            CategoryDeletionPolicy::Detach => {
                let detached = self.repository.remove_category(name, writer).await?;
                Ok(detached.iter().map(Task::id).collect())
            }
        }
    }

    // Preferences and storage

    /// Returns the user preferences.
    pub async fn preferences(&self) -> UserPreferences {
        UserPreferences::clone(&*self.preferences.snapshot().await)
    }

    /// Replaces the user preferences.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Storage`] when persistence fails.
    pub async fn update_preferences(
        &self,
        preferences: UserPreferences,
    ) -> TaskServiceResult<UserPreferences> {
        let mut writer = self.preferences.begin().await;
        *writer.draft_mut() = preferences;
        let storage = Arc::clone(&self.storage);
        let saved = writer.draft().clone();
        let published = writer
            .persist(self.config.storage_timeout, async move {
                storage.save_preferences(&saved).await
            })
            .await
            .inspect_err(|err| warn!(error = %err, "preferences not saved"))?;
        info!("preferences updated");
        Ok(UserPreferences::clone(&published))
    }

    /// Returns the stored document size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Storage`] when the store cannot be read.
    pub async fn storage_size(&self) -> TaskServiceResult<u64> {
        Ok(bounded(self.config.storage_timeout, self.storage.storage_size()).await?)
    }

    /// Removes every task, category and preference from memory and storage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Storage`] when the store cannot be
    /// cleared; nothing changes in that case.
    pub async fn clear_all_data(&self) -> TaskServiceResult<()> {
        let mut category_writer = self.categories.begin().await;
        let mut preference_writer = self.preferences.begin().await;
        category_writer.draft_mut().clear();
        *preference_writer.draft_mut() = UserPreferences::default();
        let removed = self
            .repository
            .clear_with(
                (category_writer, preference_writer),
                |(catalogue, prefs)| async move {
                    catalogue.commit().await;
                    prefs.commit().await;
                },
            )
            .await
            .inspect_err(|err| warn!(error = %err, "failed to clear stored data"))?;
        info!(tasks = removed.len(), "cleared all data");
        if !removed.is_empty() {
            self.publish(&TaskEvent::BulkOperation {
                kind: BulkOperationKind::Delete,
                affected: removed,
            });
        }
        Ok(())
    }

    // Helpers

    async fn default_sort(&self) -> SortSpec {
        self.preferences.snapshot().await.default_sort
    }

    async fn select(&self, matcher: &TaskMatcher, sort: SortSpec) -> Vec<Task> {
        let mut selected = matcher.apply(self.repository.list().await.iter());
        sort_tasks(&mut selected, sort);
        selected
    }

    fn check_title(&self, title: &str) -> Result<(), ValidationError> {
        let length = title.trim().chars().count();
        if length > self.config.max_title_chars {
            return Err(ValidationError::TitleTooLong {
                max: self.config.max_title_chars,
                actual: length,
            });
        }
        Ok(())
    }

    /// Validates `update` and canonicalises the category it assigns. When
    /// it assigns one, the returned lease must outlive the task write.
    async fn prepare_update(
        &self,
        update: TaskUpdate,
    ) -> TaskServiceResult<(TaskUpdate, Option<CatalogueLease<'_>>)> {
        update.validate()?;
        if let Some(title) = &update.title {
            self.check_title(title)?;
        }
        let Some(name) = update.assigned_category().map(str::to_owned) else {
            return Ok((update, None));
        };
        let catalogue = self.categories.hold().await;
        let canonical = resolve_category(catalogue.value(), &name)?;
        let mut prepared = update;
        prepared.category = Some(FieldPatch::Set(canonical));
        Ok((prepared, Some(catalogue)))
    }

    async fn patch_tags(
        &self,
        id: TaskId,
        tag: &str,
        patch: fn(String) -> TagsPatch,
        operation: &'static str,
    ) -> TaskServiceResult<Task> {
        let result: TaskServiceResult<(Task, bool)> = async {
            let normalized = normalize_tag(tag)?;
            let update = TaskUpdate {
                tags: Some(patch(normalized)),
                ..TaskUpdate::default()
            };
            Ok(self.repository.update_if_changed(id, &update).await?)
        }
        .await;
        match result {
            Ok((task, true)) => {
                info!(operation, task_id = %task.id(), "task tags updated");
                self.publish(&TaskEvent::Updated(task.clone()));
                Ok(task)
            }
            Ok((task, false)) => {
                debug!(operation, task_id = %task.id(), "tag change was a no-op");
                Ok(task)
            }
            Err(err) => {
                warn!(operation, error = %err, "task mutation failed");
                Err(err)
            }
        }
    }

    async fn run_bulk(
        &self,
        ids: &[TaskId],
        operation: BulkOperation,
    ) -> TaskServiceResult<BulkOutcome> {
        let kind = operation.kind();
        let outcome = self
            .bulk
            .execute(&self.repository, ids, &operation)
            .await
            .map_err(TaskServiceError::from)
            .inspect_err(|err| {
                warn!(operation = kind.as_str(), error = %err, "bulk request failed");
            })?;
        if !outcome.is_noop() {
            self.publish(&TaskEvent::BulkOperation {
                kind,
                affected: outcome.succeeded.clone(),
            });
        }
        Ok(outcome)
    }

    fn finish<T>(
        &self,
        operation: &'static str,
        result: TaskServiceResult<T>,
        event: impl FnOnce(&T) -> TaskEvent,
    ) -> TaskServiceResult<T> {
        match &result {
            Ok(value) => {
                debug!(operation, "task mutation persisted");
                self.publish(&event(value));
            }
            Err(err) => warn!(operation, error = %err, "task mutation failed"),
        }
        result
    }

    fn publish(&self, event: &TaskEvent) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_event(event);
        }
    }
}

fn resolve_category(categories: &[Category], name: &str) -> Result<String, ValidationError> {
    let normalized = normalize_category_name(name)?;
    categories
        .iter()
        .find(|category| category.is_named(&normalized))
        .map(|category| category.name().to_owned())
        .ok_or(ValidationError::UnknownCategory(normalized))
}

fn updated_event(task: &Task) -> TaskEvent {
    TaskEvent::Updated(task.clone())
}
