//! Completion tracking for spawned units of work.
//!
//! Every batch unit and every per-URL unit registers with a shared
//! [`CompletionTracker`] before it is spawned and deregisters when its
//! [`UnitGuard`] is dropped, whether it finished, failed or panicked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct TrackerState {
    outstanding: AtomicUsize,
    idle: Notify,
}

/// Shared count of outstanding units with a "wait until zero" operation.
#[derive(Clone)]
pub struct CompletionTracker {
    state: Arc<TrackerState>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(TrackerState {
                outstanding: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Register one unit. The unit is outstanding until the guard drops.
    pub fn register(&self) -> UnitGuard {
        self.state.outstanding.fetch_add(1, Ordering::AcqRel);
        UnitGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of registered units whose guards are still alive.
    ///
    /// During [`Dispatcher::dispatch`](crate::Dispatcher::dispatch) this
    /// includes one extra launch unit on top of the batch and per-URL
    /// units, released once every batch has been spawned.
    pub fn outstanding(&self) -> usize {
        self.state.outstanding.load(Ordering::Acquire)
    }

    /// Wait until no units are outstanding.
    ///
    /// Returns immediately when nothing was ever registered.
    pub async fn wait(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            // Register interest before reading the count so a concurrent
            // final drop cannot slip between the check and the await.
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters its unit from the tracker exactly once, on drop.
#[must_use = "dropping the guard immediately marks the unit as finished"]
pub struct UnitGuard {
    state: Arc<TrackerState>,
}

impl Drop for UnitGuard {
    fn drop(&mut self) {
        let previous = self.state.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "completion tracker underflow");
        if previous == 1 {
            self.state.idle.notify_waiters();
        }
    }
}
