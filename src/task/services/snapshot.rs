//! Copy-on-write snapshot with a single writer.
//!
//! Readers clone an `Arc` of the published value and never block on a
//! writer that is waiting for storage. A writer holds the gate for the
//! whole read-modify-persist cycle, mutates a private draft, and publishes
//! it with [`SnapshotWriter::commit`]. Dropping the writer without
//! committing discards the draft.
//!
//! Writers own their gate, so a save that outlives the caller's wait can
//! finish on its own task and still publish or discard the draft that
//! matches what reached storage.

use crate::task::ports::{StorageError, StorageResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard, RwLock};
use tracing::warn;

/// Published value plus the gate that serializes writers.
#[derive(Debug)]
pub(crate) struct SnapshotCell<T> {
    gate: Arc<Mutex<()>>,
    current: Arc<RwLock<Arc<T>>>,
}

impl<T: Clone> SnapshotCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            gate: Arc::new(Mutex::new(())),
            current: Arc::new(RwLock::new(Arc::new(value))),
        }
    }

    /// Returns the latest published value.
    pub(crate) async fn snapshot(&self) -> Arc<T> {
        Arc::clone(&*self.current.read().await)
    }

    /// Waits for the gate and returns the latest value. Writers stay out
    /// until the lease is dropped.
    pub(crate) async fn hold(&self) -> SnapshotLease<'_, T> {
        let gate = self.gate.lock().await;
        let value = self.snapshot().await;
        SnapshotLease { _gate: gate, value }
    }

    /// Waits for the gate and returns a writer over a copy of the latest value.
    pub(crate) async fn begin(&self) -> SnapshotWriter<T> {
        let gate = Arc::clone(&self.gate).lock_owned().await;
        let draft = T::clone(&*self.current.read().await);
        SnapshotWriter {
            current: Arc::clone(&self.current),
            _gate: gate,
            draft,
        }
    }
}

/// Read access to a [`SnapshotCell`] that keeps writers waiting.
pub(crate) struct SnapshotLease<'a, T> {
    _gate: MutexGuard<'a, ()>,
    value: Arc<T>,
}

impl<T> SnapshotLease<'_, T> {
    pub(crate) fn value(&self) -> &T {
        &self.value
    }
}

/// Exclusive draft of a [`SnapshotCell`].
pub(crate) struct SnapshotWriter<T> {
    current: Arc<RwLock<Arc<T>>>,
    _gate: OwnedMutexGuard<()>,
    draft: T,
}

impl<T> SnapshotWriter<T> {
    pub(crate) const fn draft(&self) -> &T {
        &self.draft
    }

    pub(crate) const fn draft_mut(&mut self) -> &mut T {
        &mut self.draft
    }

    /// Publishes the draft and releases the gate.
    pub(crate) async fn commit(self) -> Arc<T> {
        let Self {
            current,
            _gate: gate,
            draft,
        } = self;
        let published = Arc::new(draft);
        *current.write().await = Arc::clone(&published);
        drop(gate);
        published
    }
}

impl<T> SnapshotWriter<T>
where
    T: Send + Sync + 'static,
{
    /// Persists the draft with `save` and publishes it once the save succeeds.
    ///
    /// # Errors
    ///
    /// As for [`persist_detached`].
    pub(crate) async fn persist<F>(self, limit: Duration, save: F) -> StorageResult<Arc<T>>
    where
        F: Future<Output = StorageResult<()>> + Send + 'static,
    {
        persist_detached(limit, self, save, Self::commit).await
    }
}

/// Runs `save` on its own task, then `commit` on the held writers once the
/// save has succeeded.
///
/// The caller waits at most `limit`. A save still running at that point is
/// left to finish: its writers keep their gates until it does, and `commit`
/// runs only if it lands, so published values always match storage.
///
/// # Errors
///
/// Returns the save's [`StorageError`], or
/// [`StorageErrorCode::Timeout`](crate::task::ports::StorageErrorCode::Timeout)
/// when the caller stopped waiting. After a timeout the outcome is decided
/// by the save alone.
pub(crate) async fn persist_detached<W, F, C, CF, R>(
    limit: Duration,
    writers: W,
    save: F,
    commit: C,
) -> StorageResult<R>
where
    W: Send + 'static,
    F: Future<Output = StorageResult<()>> + Send + 'static,
    C: FnOnce(W) -> CF + Send + 'static,
    CF: Future<Output = R> + Send,
    R: Send + 'static,
{
    let pending = tokio::spawn(async move {
        match save.await {
            Ok(()) => Ok(commit(writers).await),
            Err(err) => {
                warn!(code = %err.code(), error = %err, "discarding draft after failed save");
                Err(err)
            }
        }
    });
    match tokio::time::timeout(limit, pending).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(StorageError::unavailable(format!(
            "storage task join error: {join}"
        ))),
        Err(_) => {
            warn!(
                timeout_ms = limit.as_millis(),
                "storage save still running; its result will decide the published state"
            );
            Err(StorageError::timeout(limit))
        }
    }
}
