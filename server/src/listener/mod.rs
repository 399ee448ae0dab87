//! Bus Event Listener
//!
//! Long-running subscriber that relays system events from the message bus to
//! the lab channel.
//!
//! Each iteration polls the source with a bounded wait, handles at most one
//! payload, then yields briefly. Cancellation is checked between iterations
//! and while waiting, never while a notification is being sent.

pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatch::{DeliveryOutcome, Dispatcher};
use crate::events::{FormattedNotification, PubSubEvent};

/// Pause between loop iterations.
pub const IDLE_YIELD: Duration = Duration::from_millis(100);

/// Characters of a rejected payload kept in the error log.
const PAYLOAD_PREVIEW_CHARS: usize = 500;

/// Listener errors.
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),
    #[error("Skipped {0} messages after falling behind")]
    Lagged(u64),
    #[error("Event stream closed")]
    Closed,
    #[error("Payload is not valid UTF-8")]
    NotText,
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Payload is not a JSON object")]
    NotAnObject,
}

/// A subscription yielding raw bus payloads.
#[async_trait]
pub trait EventSource: Send {
    /// Wait up to `wait` for the next payload; `Ok(None)` means the wait
    /// elapsed with nothing to do.
    async fn next_payload(&mut self, wait: Duration) -> Result<Option<String>, ListenerError>;
}

/// Renders bus payloads and hands them to the dispatcher.
struct SystemEventRelay {
    dispatcher: Dispatcher,
    channel_id: u64,
}

impl SystemEventRelay {
    async fn handle_payload(&self, payload: &str) -> Result<DeliveryOutcome, ListenerError> {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        let event = PubSubEvent::from_value(&value).ok_or(ListenerError::NotAnObject)?;
        let text = event.render();

        let outcome = self
            .dispatcher
            .deliver(FormattedNotification::new(self.channel_id, text.as_str()))
            .await;
        if outcome == DeliveryOutcome::Sent {
            info!(event_type = %event.event_type, alert = %text, "Sent system event alert");
        }
        Ok(outcome)
    }
}

/// Relays bus events to a fixed chat channel.
pub struct EventListener<S> {
    source: S,
    relay: SystemEventRelay,
    poll: Duration,
}

impl<S: EventSource> EventListener<S> {
    pub const fn new(source: S, dispatcher: Dispatcher, channel_id: u64, poll: Duration) -> Self {
        Self {
            source,
            relay: SystemEventRelay {
                dispatcher,
                channel_id,
            },
            poll,
        }
    }

    /// Run until `cancel` fires or the source closes.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(channel_id = self.relay.channel_id, "Event listener started");

        while !cancel.is_cancelled() {
            let next = tokio::select! {
                () = cancel.cancelled() => break,
                next = self.source.next_payload(self.poll) => next,
            };

            match next {
                Ok(Some(payload)) => {
                    if let Err(e) = self.relay.handle_payload(&payload).await {
                        let preview: String = payload.chars().take(PAYLOAD_PREVIEW_CHARS).collect();
                        error!(
                            error = %e,
                            payload_preview = %preview,
                            "Error processing event from bus"
                        );
                    }
                }
                Ok(None) => debug!("No bus event within poll window"),
                Err(ListenerError::Closed) => {
                    error!("Bus subscription closed, event listener exiting");
                    return;
                }
                Err(ListenerError::Lagged(skipped)) => {
                    warn!(skipped, "Event listener fell behind the bus");
                }
                Err(e) => error!(error = %e, "Failed to receive bus event"),
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(IDLE_YIELD) => {}
            }
        }

        info!("Event listener stopped");
    }

    /// Parse, render and deliver a single payload.
    pub async fn handle_payload(&self, payload: &str) -> Result<DeliveryOutcome, ListenerError> {
        self.relay.handle_payload(payload).await
    }
}
