//! Run-wide cancellation and explore scheduling.

use crate::executor::QueryExecutor;
use crate::isolate::{isolate_explore, IsolateOptions};
use lo_core::{ExploreResult, Model};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Cooperative cancellation shared by every task in a run.
///
/// Cancelling is sticky and idempotent. Waiters blocked in [`cancelled`]
/// wake immediately, and a waiter that subscribes after the fact returns
/// without blocking.
///
/// [`cancelled`]: CancelToken::cancelled
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call more than once.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until the token is cancelled.
    pub async fn cancelled(&self) {
        // Subscribe before checking the flag so a concurrent cancel cannot
        // slip between the check and the wait.
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Cancel the token once `timeout` elapses, unless the run finishes first.
///
/// The caller aborts the returned handle when the run completes on its own.
pub fn spawn_watchdog(cancel: CancelToken, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = tokio::time::sleep(timeout) => {
                log::warn!("run timed out after {}s, cancelling", timeout.as_secs());
                cancel.cancel();
            }
            () = cancel.cancelled() => {}
        }
    })
}

/// Validate every explore of a model concurrently.
///
/// One task per explore; the executor's semaphore bounds in-flight queries,
/// not explores, so any number of explores can be scheduled under a small
/// ceiling. Results arrive in completion order; the report freezes its own
/// ordering later. Skipped explores are included without being queried.
pub async fn run_explores(
    executor: Arc<QueryExecutor>,
    model: &Model,
    opts: &IsolateOptions,
) -> Vec<ExploreResult> {
    let mut handles = Vec::with_capacity(model.explores.len());
    for explore in &model.explores {
        let executor = Arc::clone(&executor);
        let explore = explore.clone();
        let opts = opts.clone();
        handles.push(tokio::spawn(async move {
            isolate_explore(&executor, &explore, &opts).await
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => results.push(result),
            // Explore tasks are never aborted, so a join failure is a panic
            // in the isolation engine. Surface it on the scheduling task.
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
    results
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
