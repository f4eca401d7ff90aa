//! Schema migrations for the persisted task document.
//!
//! Migrations operate on the raw JSON value so that documents written by
//! older layouts never need to decode into current domain types. Steps are
//! chained from the stored version to the requested one.

use crate::task::{domain::DataVersion, ports::StorageError};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;

/// Result type for migration steps.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Failure while upgrading a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// No chain of registered steps leads from one version to the other.
    #[error("no migration path from {from} to {to}")]
    NoPath {
        /// Version the chain starts from.
        from: DataVersion,
        /// Version the chain should reach.
        to: DataVersion,
    },

    /// The document does not have the shape a step expects.
    #[error("malformed document: {0}")]
    Malformed(String),
}

impl MigrationError {
    /// Creates a malformed-document error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

impl From<MigrationError> for StorageError {
    fn from(err: MigrationError) -> Self {
        Self::migration_failed(err.to_string())
    }
}

/// One upgrade step between adjacent schema versions.
///
/// Steps must be deterministic and must not drop data that maps onto the
/// target layout.
pub trait SchemaMigration: Send + Sync {
    /// Version this step reads.
    fn source(&self) -> DataVersion;

    /// Version this step produces.
    fn target(&self) -> DataVersion;

    /// Transforms the document in place.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Malformed`] when the document shape is not
    /// what the step expects.
    fn apply(&self, document: &mut Value) -> MigrationResult<()>;
}

/// Upgrade from 1.0 to 1.1.
///
/// - backfills `updatedAt` from `createdAt`
/// - adds an empty `tags` array where missing
/// - drops blank and duplicate tags
/// - lowercases `priority` values
#[derive(Debug, Default)]
pub struct NormalizeTaskRecords;

impl NormalizeTaskRecords {
    fn normalize_task(task: &mut Map<String, Value>) -> MigrationResult<()> {
        if !task.contains_key("updatedAt") {
            let created = task
                .get("createdAt")
                .cloned()
                .ok_or_else(|| MigrationError::malformed("task record without createdAt"))?;
            task.insert("updatedAt".to_owned(), created);
        }

        let tags = match task.remove("tags") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => Self::dedupe_tags(items),
            Some(_) => return Err(MigrationError::malformed("task tags must be an array")),
        };
        task.insert("tags".to_owned(), Value::Array(tags));

        if let Some(Value::String(priority)) = task.get_mut("priority") {
            *priority = priority.trim().to_ascii_lowercase();
        }
        Ok(())
    }

    fn dedupe_tags(items: Vec<Value>) -> Vec<Value> {
        let mut seen = BTreeSet::new();
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(tag) => {
                    let trimmed = tag.trim().to_owned();
                    (!trimmed.is_empty() && seen.insert(trimmed.clone()))
                        .then_some(Value::String(trimmed))
                }
                _ => None,
            })
            .collect()
    }
}

impl SchemaMigration for NormalizeTaskRecords {
    fn source(&self) -> DataVersion {
        DataVersion::V1_0
    }

    fn target(&self) -> DataVersion {
        DataVersion::V1_1
    }

    fn apply(&self, document: &mut Value) -> MigrationResult<()> {
        let Some(tasks) = document.get_mut("tasks") else {
            return Ok(());
        };
        let records = tasks
            .as_array_mut()
            .ok_or_else(|| MigrationError::malformed("tasks must be an array"))?;
        for record in records {
            let task = record
                .as_object_mut()
                .ok_or_else(|| MigrationError::malformed("task record must be an object"))?;
            Self::normalize_task(task)?;
        }
        Ok(())
    }
}

/// Ordered set of migration steps.
pub struct MigrationRegistry {
    steps: Vec<Box<dyn SchemaMigration>>,
}

impl MigrationRegistry {
    /// Creates a registry with every built-in step.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(NormalizeTaskRecords));
        registry
    }

    /// Creates a registry without steps.
    #[must_use]
    pub const fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Adds a step. A later step with the same source replaces the earlier one.
    pub fn register(&mut self, step: Box<dyn SchemaMigration>) {
        self.steps.retain(|existing| existing.source() != step.source());
        self.steps.push(step);
    }

    /// Resolves the chain of steps leading from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::NoPath`] when the chain breaks or would
    /// overshoot `to`.
    pub fn plan(
        &self,
        from: DataVersion,
        to: DataVersion,
    ) -> MigrationResult<Vec<&dyn SchemaMigration>> {
        let mut chain = Vec::new();
        let mut cursor = from;
        while cursor < to {
            let step = self
                .steps
                .iter()
                .find(|step| step.source() == cursor && step.target() > cursor)
                .ok_or(MigrationError::NoPath { from, to })?;
            cursor = step.target();
            chain.push(step.as_ref());
        }
        if cursor == to {
            Ok(chain)
        } else {
            Err(MigrationError::NoPath { from, to })
        }
    }

    /// Returns an upgraded copy of `document`, stamped with version `to`.
    ///
    /// The input is never modified, so a failed step leaves nothing half
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] when no path exists or a step fails.
    pub fn migrate(
        &self,
        document: &Value,
        from: DataVersion,
        to: DataVersion,
    ) -> MigrationResult<Value> {
        let chain = self.plan(from, to)?;
        let mut upgraded = document.clone();
        for step in chain {
            step.apply(&mut upgraded)?;
            stamp_version(&mut upgraded, step.target())?;
        }
        Ok(upgraded)
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field(
                "steps",
                &self
                    .steps
                    .iter()
                    .map(|step| format!("{}->{}", step.source(), step.target()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Reads the `version` field of a raw document.
///
/// Documents written before versioning carry no field and count as 1.0.
///
/// # Errors
///
/// Returns [`MigrationError::Malformed`] when the field is present but not a
/// `major.minor` string.
pub fn document_version(document: &Value) -> MigrationResult<DataVersion> {
    match document.get("version") {
        None | Some(Value::Null) => Ok(DataVersion::V1_0),
        Some(Value::String(raw)) => raw
            .parse::<DataVersion>()
            .map_err(|err| MigrationError::malformed(err.to_string())),
        Some(_) => Err(MigrationError::malformed("version must be a string")),
    }
}

/// Writes the `version` field of a raw document.
///
/// # Errors
///
/// Returns [`MigrationError::Malformed`] when the document is not an object.
pub fn stamp_version(document: &mut Value, version: DataVersion) -> MigrationResult<()> {
    let object = document
        .as_object_mut()
        .ok_or_else(|| MigrationError::malformed("document must be an object"))?;
    object.insert("version".to_owned(), Value::String(version.to_string()));
    Ok(())
}
