//! Single-use handle around a temporary key

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::domain::temp_key::{TempKeyError, TempKeyId, TempKeyStore, TemporaryCredential};
use crate::infrastructure::observability::{record_cleanup, record_swept};

use super::sweeper::stale_cutoff;

/// Revocation of one temporary key; runs at most once
#[derive(Debug)]
struct CleanupTask {
    key_id: TempKeyId,
    store: Arc<dyn TempKeyStore>,
    ttl: Duration,
    sweep_stale: bool,
    done: AtomicBool,
}

impl CleanupTask {
    /// Best effort: failures are logged and counted, never returned
    async fn run(&self) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }

        if self.sweep_stale {
            self.sweep().await;
        }

        match self.store.delete(&self.key_id).await {
            Ok(0) => {
                record_cleanup("delete", true);
                debug!(key_id = %self.key_id, "Temporary key was already removed");
            }
            Ok(deleted) => {
                record_cleanup("delete", true);
                debug!(key_id = %self.key_id, deleted, "Temporary key revoked");
            }
            Err(e) => {
                record_cleanup("delete", false);
                warn!(key_id = %self.key_id, "Failed to revoke temporary key: {}", e);
            }
        }
    }

    async fn sweep(&self) {
        let Some(cutoff) = stale_cutoff(self.ttl) else {
            warn!(ttl = ?self.ttl, "Temp key TTL out of range, skipping stale sweep");
            return;
        };

        match self.store.soft_delete_stale(cutoff).await {
            Ok(swept) => {
                record_cleanup("sweep", true);
                record_swept(swept);
                debug!(key_id = %self.key_id, swept, "Swept stale temporary keys");
            }
            Err(e) => {
                record_cleanup("sweep", false);
                warn!(key_id = %self.key_id, "Failed to sweep stale temporary keys: {}", e);
            }
        }
    }
}

/// Runs the cleanup on every exit path of [`SingleUseHandle::with`]
///
/// `finish` runs it inline. If the `with` future is dropped first, the
/// cleanup is spawned onto the current tokio runtime instead.
struct CleanupGuard {
    task: Option<Arc<CleanupTask>>,
}

impl CleanupGuard {
    fn new(task: Arc<CleanupTask>) -> Self {
        Self { task: Some(task) }
    }

    async fn finish(mut self) {
        if let Some(task) = self.task.take() {
            task.run().await;
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(key_id = %task.key_id, "Temporary key use cancelled, revoking in background");
                runtime.spawn(async move { task.run().await });
            }
            Err(_) => {
                warn!(
                    key_id = %task.key_id,
                    "No runtime to revoke cancelled temporary key; leaving it to the stale sweep"
                );
            }
        }
    }
}

/// A temporary key that can be used by exactly one callback
///
/// Handles produced from the same memoized issuance share the backing key:
/// whichever finishes first revokes it for all of them.
///
/// Concurrent `with` calls on one handle are not supported; the loser of such
/// a race gets [`TempKeyError::AlreadyUsed`].
#[derive(Debug)]
pub struct SingleUseHandle {
    credential: TemporaryCredential,
    used: AtomicBool,
    cleanup: Arc<CleanupTask>,
}

impl SingleUseHandle {
    pub(crate) fn new(
        credential: TemporaryCredential,
        store: Arc<dyn TempKeyStore>,
        ttl: Duration,
        sweep_stale: bool,
    ) -> Self {
        let cleanup = Arc::new(CleanupTask {
            key_id: *credential.id(),
            store,
            ttl,
            sweep_stale,
            done: AtomicBool::new(false),
        });

        Self {
            credential,
            used: AtomicBool::new(false),
            cleanup,
        }
    }

    /// Id of the backing key row
    pub fn key_id(&self) -> &TempKeyId {
        self.credential.id()
    }

    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    /// Run `callback` with the raw key, then revoke the key
    ///
    /// The key is revoked whether the callback succeeds, fails or panics; a
    /// panic is resumed after revocation. A second call fails with
    /// [`TempKeyError::AlreadyUsed`] without running anything.
    pub async fn with<F, Fut, T, E>(&self, callback: F) -> Result<T, E>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TempKeyError>,
    {
        if self.used.swap(true, Ordering::AcqRel) {
            warn!(key_id = %self.key_id(), "Temporary key handle used twice");
            return Err(TempKeyError::AlreadyUsed.into());
        }

        let guard = CleanupGuard::new(Arc::clone(&self.cleanup));
        let api_key = self.credential.api_key().to_string();

        let outcome = AssertUnwindSafe(async move { callback(api_key).await })
            .catch_unwind()
            .await;

        guard.finish().await;

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
