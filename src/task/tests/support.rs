//! Shared fixtures for task unit tests.

use crate::task::{
    adapters::{DocumentBackend, DocumentStorage, MemoryDocument},
    domain::DataVersion,
    ports::StorageResult,
};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::Mutex;
use std::time::Duration;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().expect("clock lock should not be poisoned");
        *now += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(epoch())
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock should not be poisoned")
    }
}

/// Fixed instant used as "now" across tests.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
        .single()
        .expect("valid fixed timestamp")
}

/// Document backend whose writes block for a fixed delay before landing.
///
/// Starts with an empty document at the current version so opening a
/// service over it needs no write.
#[derive(Debug, Clone)]
pub struct SlowDocument {
    inner: MemoryDocument,
    write_delay: Duration,
}

impl SlowDocument {
    pub fn new(write_delay: Duration) -> Self {
        let initial = serde_json::json!({ "version": DataVersion::CURRENT, "tasks": [] });
        Self {
            inner: MemoryDocument::with_contents(initial.to_string()),
            write_delay,
        }
    }

    /// Handle on the underlying document, shared with the backend.
    pub fn document(&self) -> MemoryDocument {
        self.inner.clone()
    }
}

impl DocumentBackend for SlowDocument {
    fn read(&self) -> StorageResult<Option<String>> {
        self.inner.read()
    }

    fn write(&self, contents: &str) -> StorageResult<()> {
        std::thread::sleep(self.write_delay);
        self.inner.write(contents)
    }

    fn clear(&self) -> StorageResult<()> {
        self.inner.clear()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

pub type SlowDocumentStorage = DocumentStorage<SlowDocument>;
