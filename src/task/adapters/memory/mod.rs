//! In-memory document backend for tests and ephemeral sessions.

use super::document::{DocumentBackend, DocumentStorage};
use crate::task::ports::{StorageError, StorageResult};
use std::sync::{Arc, RwLock};

/// Storage adapter that keeps the document in process memory.
pub type InMemoryStorage = DocumentStorage<MemoryDocument>;

/// Thread-safe in-memory document.
///
/// Clones share the same document, so a test can keep a handle after
/// moving the storage into a service.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug)]
struct MemoryState {
    contents: Option<String>,
    available: bool,
}

impl MemoryDocument {
    /// Creates an empty, available document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState {
                contents: None,
                available: true,
            })),
        }
    }

    /// Creates a document holding `contents`, as if written earlier.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let document = Self::new();
        if let Ok(mut state) = document.state.write() {
            state.contents = Some(contents.into());
        }
        document
    }

    /// Makes every subsequent read and write fail as unavailable, or
    /// restores access.
    pub fn set_available(&self, available: bool) {
        if let Ok(mut state) = self.state.write() {
            state.available = available;
        }
    }

    /// Returns a copy of the raw stored text.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.contents.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> StorageResult<T> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StorageError::unavailable(err.to_string()))?;
        if !state.available {
            return Err(StorageError::unavailable("in-memory storage disabled"));
        }
        Ok(f(&mut state))
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBackend for MemoryDocument {
    fn read(&self) -> StorageResult<Option<String>> {
        self.with_state(|state| state.contents.clone())
    }

    fn write(&self, contents: &str) -> StorageResult<()> {
        self.with_state(|state| state.contents = Some(contents.to_owned()))
    }

    fn clear(&self) -> StorageResult<()> {
        self.with_state(|state| state.contents = None)
    }

    fn size(&self) -> StorageResult<u64> {
        self.with_state(|state| {
            state
                .contents
                .as_ref()
                .map_or(0, |text| u64::try_from(text.len()).unwrap_or(u64::MAX))
        })
    }

    fn is_available(&self) -> bool {
        self.state.read().is_ok_and(|state| state.available)
    }
}

impl InMemoryStorage {
    /// Creates an empty in-memory store without a capacity limit.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryDocument::new())
    }

    /// Toggles availability of the underlying document.
    pub fn set_available(&self, available: bool) {
        self.backend().set_available(available);
    }
}
