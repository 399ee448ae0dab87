//! Readiness Gate
//!
//! One-shot signal opened once the chat client has finished its handshake.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Broadcast-once readiness signal shared by every consumer.
///
/// Cloning is cheap; all clones observe the same gate.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    tx: Arc<watch::Sender<bool>>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Open the gate. Later calls are no-ops.
    pub fn mark_ready(&self) {
        self.tx.send_if_modified(|ready| !std::mem::replace(ready, true));
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the gate is open.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Wait until the gate is open, giving up after `limit`.
    ///
    /// Returns `true` if the gate opened in time.
    pub async fn wait_timeout(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait()).await.is_ok()
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
