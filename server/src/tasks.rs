//! Background Tasks
//!
//! Shutdown-aware group for fire-and-forget work and long-running loops.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Tracks spawned tasks and carries the process shutdown signal.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled when shutdown begins.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Spawn a tracked task. Panics inside `fut` are logged, not propagated.
    pub fn spawn<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inner = tokio::spawn(fut);
        self.tracker.spawn(async move {
            if let Err(e) = inner.await {
                if e.is_panic() {
                    error!(task = name, "Background task panicked: {}", e);
                }
            }
        });
    }

    /// Cancel, stop accepting tasks, and wait for in-flight work up to `grace`.
    ///
    /// Returns the number of tasks abandoned when the bound was hit.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.cancel.cancel();
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            info!("Background tasks drained");
            0
        } else {
            let abandoned = self.tracker.len();
            warn!(
                abandoned,
                grace_secs = grace.as_secs(),
                "Shutdown grace elapsed with tasks still running"
            );
            abandoned
        }
    }
}
