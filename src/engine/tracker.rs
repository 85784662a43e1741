//! Outstanding-work counter for detached task trees.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Counts units of work that have been registered but not yet finished.
///
/// A task that spawns children must register them before spawning, while it
/// still holds its own unit; the counter then cannot reach zero while any part
/// of the tree is still running. [`WorkTracker::guard`] does both steps and
/// releases the unit on drop, including when the task fails or panics.
#[derive(Debug, Clone, Default)]
pub struct WorkTracker {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    outstanding: AtomicUsize,
    idle: Notify,
}

impl WorkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `units` pending units of work.
    pub fn register(&self, units: usize) {
        self.inner.outstanding.fetch_add(units, Ordering::AcqRel);
    }

    /// Mark one unit as finished.
    pub fn done(&self) {
        let previous = self.inner.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "WorkTracker::done called more often than register");
        if previous == 1 {
            self.inner.idle.notify_waiters();
        }
    }

    /// Register one unit and return a guard that finishes it when dropped.
    pub fn guard(&self) -> WorkGuard {
        self.register(1);
        WorkGuard {
            tracker: self.clone(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Wait until every registered unit has finished.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Subscribe before checking so a notify between check and await is kept.
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// One registered unit of work; finished on drop.
#[derive(Debug)]
pub struct WorkGuard {
    tracker: WorkTracker,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.tracker.done();
    }
}
