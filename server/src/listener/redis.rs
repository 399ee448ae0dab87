//! Redis Pub/Sub Source
//!
//! Dedicated subscriber connection feeding the event listener.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use fred::prelude::*;
use fred::types::Message;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::info;

use super::{EventSource, ListenerError};

/// Create Redis client.
pub async fn create_redis_client(redis_url: &str) -> Result<Client> {
    let config = Config::from_url(redis_url)?;
    let client = Client::new(config, None, None, None);
    client.connect();
    client.wait_for_connect().await?;

    info!("Connected to Redis");
    Ok(client)
}

/// A subscription to a single Redis pub/sub channel.
pub struct RedisEventSource {
    subscriber: Client,
    messages: broadcast::Receiver<Message>,
    channel: String,
}

impl RedisEventSource {
    /// Open a subscriber connection cloned from `redis` and subscribe to `channel`.
    pub async fn subscribe(redis: &Client, channel: &str) -> Result<Self, ListenerError> {
        let subscriber = redis.clone_new();
        let _connect_handle = subscriber.connect();
        subscriber.wait_for_connect().await?;

        // Take the receiver before subscribing so no message is missed.
        let messages = subscriber.message_rx();
        subscriber.subscribe(channel).await?;
        info!(bus_channel = %channel, "Subscribed to Redis channel");

        Ok(Self {
            subscriber,
            messages,
            channel: channel.to_string(),
        })
    }

    /// Unsubscribe and close the subscriber connection.
    pub async fn close(self) -> Result<(), ListenerError> {
        self.subscriber.unsubscribe(self.channel.as_str()).await?;
        self.subscriber.quit().await?;
        Ok(())
    }
}

#[async_trait]
impl EventSource for RedisEventSource {
    async fn next_payload(&mut self, wait: Duration) -> Result<Option<String>, ListenerError> {
        loop {
            let message = match tokio::time::timeout(wait, self.messages.recv()).await {
                Err(_elapsed) => return Ok(None),
                Ok(Err(RecvError::Lagged(skipped))) => return Err(ListenerError::Lagged(skipped)),
                Ok(Err(RecvError::Closed)) => return Err(ListenerError::Closed),
                Ok(Ok(message)) => message,
            };

            // The receiver sees every channel this connection is subscribed to.
            if message.channel.as_bytes() != self.channel.as_bytes() {
                continue;
            }

            return message
                .value
                .as_string()
                .map(Some)
                .ok_or(ListenerError::NotText);
        }
    }
}
