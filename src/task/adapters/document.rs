//! Storage adapter over a single JSON document.
//!
//! The document holds every persisted collection:
//!
//! ```json
//! { "version": "1.1", "tasks": [], "categories": [], "preferences": {} }
//! ```
//!
//! A [`DocumentBackend`] only knows how to read and replace the raw text.
//! [`DocumentStorage`] layers decoding, capacity checks and migrations on
//! top and runs backend calls on the blocking thread pool. Quota refusals,
//! failures and completed migrations are reported to any registered
//! [`StorageEventListener`].

use super::migration::{MigrationRegistry, document_version, stamp_version};
use crate::task::{
    domain::{Category, DataVersion, Task, UserPreferences},
    ports::{StorageAdapter, StorageError, StorageEvent, StorageEventListener, StorageResult},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Raw document store.
///
/// Implementations are synchronous and may block; [`DocumentStorage`]
/// calls them through [`tokio::task::spawn_blocking`].
pub trait DocumentBackend: Send + Sync + 'static {
    /// Returns the stored text, or `None` when nothing has been written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be read.
    fn read(&self) -> StorageResult<Option<String>>;

    /// Atomically replaces the stored text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be written.
    fn write(&self, contents: &str) -> StorageResult<()>;

    /// Removes the stored text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be written.
    fn clear(&self) -> StorageResult<()>;

    /// Returns the size of the stored text in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be read.
    fn size(&self) -> StorageResult<u64>;

    /// Returns `true` when the store accepts reads and writes.
    fn is_available(&self) -> bool;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    #[serde(default = "legacy_version")]
    version: DataVersion,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    preferences: UserPreferences,
}

const fn legacy_version() -> DataVersion {
    DataVersion::V1_0
}

/// [`StorageAdapter`] persisting one JSON document through a backend.
pub struct DocumentStorage<B> {
    backend: Arc<B>,
    capacity: Option<u64>,
    migrations: MigrationRegistry,
    listeners: Vec<Arc<dyn StorageEventListener>>,
    write_gate: Mutex<()>,
}

impl<B: fmt::Debug> fmt::Debug for DocumentStorage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStorage")
            .field("backend", &self.backend)
            .field("capacity", &self.capacity)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<B: DocumentBackend> DocumentStorage<B> {
    /// Wraps a backend without a capacity limit.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            capacity: None,
            migrations: MigrationRegistry::new(),
            listeners: Vec::new(),
            write_gate: Mutex::new(()),
        }
    }

    /// Limits the encoded document to `bytes`.
    #[must_use]
    pub const fn with_capacity(mut self, bytes: u64) -> Self {
        self.capacity = Some(bytes);
        self
    }

    /// Replaces the migration steps.
    #[must_use]
    pub fn with_migrations(mut self, migrations: MigrationRegistry) -> Self {
        self.migrations = migrations;
        self
    }

    /// Registers a listener for quota, failure and migration events.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn StorageEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Returns the configured capacity in bytes.
    #[must_use]
    pub const fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn notify(&self, event: &StorageEvent) {
        for listener in &self.listeners {
            listener.on_storage_event(event);
        }
    }

    fn report(&self, err: StorageError) -> StorageError {
        self.notify(&StorageEvent::Failed(err.clone()));
        err
    }

    async fn run_blocking<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&B) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || f(&backend))
            .await
            .map_err(|err| StorageError::unavailable(format!("storage task join error: {err}")))?
    }

    async fn read_text(&self) -> StorageResult<Option<String>> {
        self.run_blocking(DocumentBackend::read).await
    }

    async fn write_text(&self, contents: String) -> StorageResult<()> {
        let required = u64::try_from(contents.len()).unwrap_or(u64::MAX);
        if let Some(available) = self.capacity.filter(|limit| required > *limit) {
            warn!(required, available, "document exceeds storage capacity");
            self.notify(&StorageEvent::QuotaExceeded {
                required,
                available,
            });
            return Err(StorageError::quota_exceeded(required, available));
        }
        self.run_blocking(move |backend| backend.write(&contents))
            .await
            .map_err(|err| self.report(err))
    }

    async fn read_document(&self) -> StorageResult<StoredDocument> {
        match self.read_text().await? {
            None => Ok(StoredDocument {
                version: DataVersion::CURRENT,
                ..StoredDocument::default()
            }),
            Some(text) => serde_json::from_str(&text).map_err(|err| {
                warn!(error = %err, "stored document is not decodable");
                self.report(StorageError::parse(err.to_string()))
            }),
        }
    }

    async fn read_value(&self) -> StorageResult<Option<Value>> {
        self.read_text()
            .await?
            .map(|text| {
                serde_json::from_str(&text).map_err(|err| StorageError::parse(err.to_string()))
            })
            .transpose()
    }

    async fn write_value(&self, value: &Value) -> StorageResult<()> {
        let text =
            serde_json::to_string(value).map_err(|err| StorageError::parse(err.to_string()))?;
        self.write_text(text).await
    }

    async fn modify<F>(&self, change: F) -> StorageResult<()>
    where
        F: FnOnce(&mut StoredDocument) + Send,
    {
        let _gate = self.write_gate.lock().await;
        let mut document = self.read_document().await?;
        change(&mut document);
        let text = serde_json::to_string(&document)
            .map_err(|err| StorageError::parse(err.to_string()))?;
        self.write_text(text).await
    }
}

#[async_trait]
impl<B: DocumentBackend> StorageAdapter for DocumentStorage<B> {
    async fn save_tasks(&self, tasks: &[Task]) -> StorageResult<()> {
        let replacement = tasks.to_vec();
        self.modify(move |document| document.tasks = replacement)
            .await
    }

    async fn load_tasks(&self) -> StorageResult<Vec<Task>> {
        let document = self.read_document().await?;
        debug!(count = document.tasks.len(), "loaded tasks");
        Ok(document.tasks)
    }

    async fn save_categories(&self, categories: &[Category]) -> StorageResult<()> {
        let replacement = categories.to_vec();
        self.modify(move |document| document.categories = replacement)
            .await
    }

    async fn load_categories(&self) -> StorageResult<Vec<Category>> {
        Ok(self.read_document().await?.categories)
    }

    async fn save_catalogue(&self, tasks: &[Task], categories: &[Category]) -> StorageResult<()> {
        let task_replacement = tasks.to_vec();
        let category_replacement = categories.to_vec();
        self.modify(move |document| {
            document.tasks = task_replacement;
            document.categories = category_replacement;
        })
        .await
    }

    async fn save_preferences(&self, preferences: &UserPreferences) -> StorageResult<()> {
        let replacement = preferences.clone();
        self.modify(move |document| document.preferences = replacement)
            .await
    }

    async fn load_preferences(&self) -> StorageResult<UserPreferences> {
        Ok(self.read_document().await?.preferences)
    }

    async fn clear_all_data(&self) -> StorageResult<()> {
        let _gate = self.write_gate.lock().await;
        self.run_blocking(DocumentBackend::clear).await?;
        info!("cleared stored document");
        Ok(())
    }

    async fn storage_size(&self) -> StorageResult<u64> {
        self.run_blocking(DocumentBackend::size).await
    }

    async fn is_storage_available(&self) -> bool {
        self.run_blocking(|backend| Ok(backend.is_available()))
            .await
            .unwrap_or(false)
    }

    async fn data_version(&self) -> StorageResult<Option<DataVersion>> {
        self.read_value()
            .await?
            .map(|value| {
                document_version(&value).map_err(|err| StorageError::parse(err.to_string()))
            })
            .transpose()
    }

    async fn set_data_version(&self, version: DataVersion) -> StorageResult<()> {
        let _gate = self.write_gate.lock().await;
        let mut value = match self.read_value().await? {
            Some(value) => value,
            None => serde_json::to_value(StoredDocument::default())
                .map_err(|err| StorageError::parse(err.to_string()))?,
        };
        stamp_version(&mut value, version).map_err(|err| StorageError::parse(err.to_string()))?;
        self.write_value(&value).await
    }

    async fn migrate_data(&self, from: DataVersion, to: DataVersion) -> StorageResult<()> {
        let _gate = self.write_gate.lock().await;
        let Some(value) = self.read_value().await? else {
            let fresh = StoredDocument {
                version: to,
                ..StoredDocument::default()
            };
            let text = serde_json::to_string(&fresh)
                .map_err(|err| StorageError::parse(err.to_string()))?;
            self.write_text(text).await?;
            info!(version = %to, "initialised empty document");
            return Ok(());
        };

        let stored = document_version(&value).map_err(StorageError::from)?;
        if stored == to {
            debug!(version = %to, "document already at requested version");
            return Ok(());
        }
        if stored != from {
            warn!(%stored, %from, %to, "stored version does not match migration source");
            return Err(self.report(StorageError::migration_failed(format!(
                "stored version {stored} does not match expected {from}"
            ))));
        }

        let upgraded = self
            .migrations
            .migrate(&value, from, to)
            .map_err(|err| {
                warn!(error = %err, %from, %to, "migration failed");
                self.report(StorageError::from(err))
            })?;
        self.write_value(&upgraded).await?;
        info!(%from, %to, "migrated stored document");
        self.notify(&StorageEvent::DataMigrated { from, to });
        Ok(())
    }
}
