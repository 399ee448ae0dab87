//! Server Configuration
//!
//! Loads configuration from environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default Redis pub/sub channel carrying system events.
pub const DEFAULT_EVENT_CHANNEL: &str = "server_events";

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Discord bot token
    pub discord_token: String,

    /// Discord channel receiving GitHub notifications
    pub github_channel_id: u64,

    /// Discord channel receiving system events from the bus
    pub lab_channel_id: u64,

    /// Shared secret for `X-Hub-Signature-256` verification (None = insecure mode)
    pub webhook_secret: Option<String>,

    /// Redis connection URL
    pub redis_url: String,

    /// Redis pub/sub channel to subscribe to
    pub event_channel: String,

    /// Log filter directive used when `RUST_LOG` is unset (default: "info")
    pub log_level: String,

    /// Maximum accepted webhook body in bytes (default: 1MB)
    pub max_webhook_body: usize,

    /// Bounded wait for a single bus poll (default: 5s)
    pub listener_poll: Duration,

    /// Longest a delivery waits for the chat client to become ready (default: 300s)
    pub chat_ready_timeout: Duration,

    /// Drain bound for in-flight deliveries at shutdown (default: 10s)
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |key: &str, default: u64| {
            Duration::from_secs(
                lookup(key)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            discord_token: lookup("DISCORD_BOT_TOKEN")
                .filter(|v| !v.trim().is_empty())
                .context("DISCORD_BOT_TOKEN must be set")?,
            github_channel_id: parse_channel_id("GITHUB_CHANNEL_ID", lookup("GITHUB_CHANNEL_ID"))?,
            lab_channel_id: parse_channel_id("LAB_CHANNEL_ID", lookup("LAB_CHANNEL_ID"))?,
            webhook_secret: lookup("GITHUB_WEBHOOK_SECRET").filter(|v| !v.is_empty()),
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".into()),
            event_channel: lookup("EVENT_CHANNEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_CHANNEL.into()),
            log_level: lookup("LOG_LEVEL")
                .map(|v| v.to_ascii_lowercase())
                .unwrap_or_else(|| "info".into()),
            max_webhook_body: lookup("MAX_WEBHOOK_BODY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            listener_poll: secs("LISTENER_POLL_SECS", 5),
            chat_ready_timeout: secs("CHAT_READY_TIMEOUT_SECS", 300),
            shutdown_grace: secs("SHUTDOWN_GRACE_SECS", 10),
        })
    }

    /// Check if webhook signature verification is enabled.
    #[must_use]
    pub const fn verifies_signatures(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Create a default configuration for testing.
    ///
    /// Redis: `docker run -d --name hookrelay-test-redis -p 6380:6379 redis:7`
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            discord_token: "test-token".into(),
            github_channel_id: 1001,
            lab_channel_id: 2002,
            webhook_secret: Some("test-webhook-secret".into()),
            redis_url: "redis://localhost:6380".into(),
            event_channel: DEFAULT_EVENT_CHANNEL.into(),
            log_level: "debug".into(),
            max_webhook_body: 1024 * 1024,
            listener_poll: Duration::from_millis(200),
            chat_ready_timeout: Duration::from_secs(2),
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("discord_token", &"<redacted>")
            .field("github_channel_id", &self.github_channel_id)
            .field("lab_channel_id", &self.lab_channel_id)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("redis_url", &self.redis_url)
            .field("event_channel", &self.event_channel)
            .field("log_level", &self.log_level)
            .field("max_webhook_body", &self.max_webhook_body)
            .field("listener_poll", &self.listener_poll)
            .field("chat_ready_timeout", &self.chat_ready_timeout)
            .field("shutdown_grace", &self.shutdown_grace)
            .finish()
    }
}

/// Parse a required, non-zero Discord channel ID.
fn parse_channel_id(key: &str, raw: Option<String>) -> Result<u64> {
    let raw = raw.with_context(|| format!("{key} must be set"))?;
    let id: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a numeric channel ID"))?;
    if id == 0 {
        bail!("{key} must not be zero");
    }
    Ok(id)
}
