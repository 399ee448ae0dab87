//! Notification Dispatch
//!
//! Best-effort delivery of rendered notifications to chat channels.
//!
//! A delivery waits for the readiness gate, resolves the destination channel
//! freshly against the chat client, and sends once. Failures are logged and
//! swallowed; nothing is retried.

pub mod discord;
pub mod readiness;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::events::FormattedNotification;
pub use readiness::ReadinessGate;

/// A live chat channel resolved from its numeric ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    pub id: u64,
    pub name: String,
}

/// Chat transport errors.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Discord error: {0}")]
    Discord(#[from] Box<serenity::Error>),
    #[error("Send rejected: {0}")]
    Rejected(String),
}

impl From<serenity::Error> for ChatError {
    fn from(err: serenity::Error) -> Self {
        Self::Discord(Box::new(err))
    }
}

/// The chat platform as seen by the dispatcher.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Look up a channel in the client's current channel set.
    async fn resolve_channel(&self, channel_id: u64) -> Option<ChannelTarget>;

    /// Send plain text to a resolved channel.
    async fn send(&self, target: &ChannelTarget, text: &str) -> Result<(), ChatError>;
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    NotReady,
    ChannelNotFound,
    Failed,
}

/// Shared handle used by the webhook intake and the bus listener.
#[derive(Clone)]
pub struct Dispatcher {
    platform: Arc<dyn ChatPlatform>,
    ready: ReadinessGate,
    ready_timeout: Duration,
}

impl Dispatcher {
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>, ready: ReadinessGate, ready_timeout: Duration) -> Self {
        Self {
            platform,
            ready,
            ready_timeout,
        }
    }

    /// Whether the chat client has completed its handshake.
    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    /// Deliver a notification. Never fails; the outcome is informational.
    pub async fn deliver(&self, notification: FormattedNotification) -> DeliveryOutcome {
        let channel_id = notification.destination_channel_id;

        if !self.ready.wait_timeout(self.ready_timeout).await {
            error!(
                channel_id,
                timeout_secs = self.ready_timeout.as_secs(),
                "Chat client not ready, dropping notification"
            );
            return DeliveryOutcome::NotReady;
        }

        let Some(target) = self.platform.resolve_channel(channel_id).await else {
            error!(channel_id, "Channel not found, check the configured channel ID");
            return DeliveryOutcome::ChannelNotFound;
        };

        match self.platform.send(&target, &notification.text).await {
            Ok(()) => {
                info!(channel_id, channel = %target.name, "Notification sent");
                DeliveryOutcome::Sent
            }
            Err(e) => {
                error!(channel_id, error = %e, "Failed to send notification");
                DeliveryOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory chat platform and log capture for unit tests.

    use std::collections::HashSet;
    use std::sync::Mutex;

    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt as _};
    use tracing_subscriber::{Layer, Registry};

    use super::*;

    #[derive(Default)]
    pub struct RecordingPlatform {
        pub channels: HashSet<u64>,
        pub fail_sends: bool,
        pub sent: Mutex<Vec<(u64, String)>>,
        pub lookups: Mutex<Vec<u64>>,
    }

    impl RecordingPlatform {
        pub fn with_channels(ids: &[u64]) -> Self {
            Self {
                channels: ids.iter().copied().collect(),
                ..Self::default()
            }
        }

        pub fn sent(&self) -> Vec<(u64, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatPlatform for RecordingPlatform {
        async fn resolve_channel(&self, channel_id: u64) -> Option<ChannelTarget> {
            self.lookups.lock().unwrap().push(channel_id);
            self.channels.contains(&channel_id).then(|| ChannelTarget {
                id: channel_id,
                name: format!("channel-{channel_id}"),
            })
        }

        async fn send(&self, target: &ChannelTarget, text: &str) -> Result<(), ChatError> {
            if self.fail_sends {
                return Err(ChatError::Rejected("missing permissions".into()));
            }
            self.sent.lock().unwrap().push((target.id, text.to_string()));
            Ok(())
        }
    }

    /// Layer recording the level of every event it sees.
    #[derive(Clone, Default)]
    pub struct LevelCounter {
        levels: Arc<Mutex<Vec<Level>>>,
    }

    impl LevelCounter {
        /// Subscriber feeding this counter; scope it with `WithSubscriber`.
        pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
            Registry::default().with(self.clone())
        }

        pub fn count(&self, level: Level) -> usize {
            self.levels
                .lock()
                .unwrap()
                .iter()
                .filter(|l| **l == level)
                .count()
        }
    }

    impl<S: Subscriber> Layer<S> for LevelCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.levels.lock().unwrap().push(*event.metadata().level());
        }
    }

    pub fn ready_dispatcher(platform: Arc<RecordingPlatform>) -> Dispatcher {
        let gate = ReadinessGate::new();
        gate.mark_ready();
        Dispatcher::new(platform, gate, Duration::from_secs(1))
    }
}
