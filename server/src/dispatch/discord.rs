//! Discord Chat Platform
//!
//! Serenity gateway client backing [`ChatPlatform`]. The readiness gate opens
//! on `cache_ready`, once guild channels are in the cache.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{ChannelId, Context, EventHandler, GatewayIntents, GuildId, Ready};
use serenity::cache::Cache;
use serenity::gateway::ShardManager;
use serenity::http::Http;
use serenity::Client;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{ChannelTarget, ChatError, ChatPlatform, ReadinessGate};

/// Gateway event handler that opens the readiness gate.
struct ReadyHandler {
    gate: ReadinessGate,
}

#[async_trait]
impl EventHandler for ReadyHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Discord session established"
        );
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        info!(guilds = guilds.len(), "Discord cache ready");
        self.gate.mark_ready();
    }
}

/// Discord implementation of [`ChatPlatform`].
#[derive(Clone)]
pub struct DiscordPlatform {
    cache: Arc<Cache>,
    http: Arc<Http>,
}

impl DiscordPlatform {
    /// Find a channel in any cached guild. Kept synchronous so cache guards
    /// never cross an await.
    fn lookup(&self, channel_id: u64) -> Option<ChannelTarget> {
        if channel_id == 0 {
            return None;
        }
        let channel_id = ChannelId::new(channel_id);
        self.cache.guilds().into_iter().find_map(|guild_id| {
            let guild = self.cache.guild(guild_id)?;
            let channel = guild.channels.get(&channel_id)?;
            Some(ChannelTarget {
                id: channel.id.get(),
                name: channel.name.clone(),
            })
        })
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn resolve_channel(&self, channel_id: u64) -> Option<ChannelTarget> {
        self.lookup(channel_id)
    }

    async fn send(&self, target: &ChannelTarget, text: &str) -> Result<(), ChatError> {
        ChannelId::new(target.id)
            .say(self.http.as_ref(), text)
            .await?;
        Ok(())
    }
}

/// A running Discord client.
pub struct DiscordSession {
    pub platform: DiscordPlatform,
    shard_manager: Arc<ShardManager>,
    handle: JoinHandle<()>,
}

impl DiscordSession {
    /// Log in and start the gateway connection in the background.
    ///
    /// Returns as soon as the client is built; `gate` opens later.
    pub async fn start(token: &str, gate: ReadinessGate) -> Result<Self> {
        let intents = GatewayIntents::GUILDS;
        let mut client = Client::builder(token, intents)
            .event_handler(ReadyHandler { gate })
            .await
            .context("Failed to build Discord client")?;

        let platform = DiscordPlatform {
            cache: client.cache.clone(),
            http: client.http.clone(),
        };
        let shard_manager = client.shard_manager.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = client.start().await {
                error!(error = %e, "Discord client stopped");
            }
        });

        Ok(Self {
            platform,
            shard_manager,
            handle,
        })
    }

    /// Close all shards and wait for the client task to finish.
    pub async fn shutdown(self) {
        self.shard_manager.shutdown_all().await;
        if let Err(e) = self.handle.await {
            error!(error = %e, "Discord client task panicked");
        }
        info!("Discord client shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_platform() -> DiscordPlatform {
        DiscordPlatform {
            cache: Arc::new(Cache::new()),
            http: Arc::new(Http::new("test-token")),
        }
    }

    #[tokio::test]
    async fn empty_cache_resolves_nothing() {
        let platform = offline_platform();
        assert_eq!(platform.resolve_channel(1001).await, None);
        assert_eq!(platform.resolve_channel(0).await, None);
    }
}
