//! Hookrelay Server - Main Entry Point
//!
//! Forwards GitHub webhooks and bus events to Discord.

use std::sync::Arc;

use anyhow::Result;
use fred::interfaces::ClientLike as _;
use tracing::{error, info, warn};

use hookrelay_server::api::{create_router, AppState};
use hookrelay_server::dispatch::discord::DiscordSession;
use hookrelay_server::dispatch::{Dispatcher, ReadinessGate};
use hookrelay_server::listener::redis::{create_redis_client, RedisEventSource};
use hookrelay_server::listener::EventListener;
use hookrelay_server::tasks::BackgroundTasks;
use hookrelay_server::{config, observability};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    // Initialize tracing
    observability::init(&config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Hookrelay Server"
    );
    if !config.verifies_signatures() {
        warn!("GITHUB_WEBHOOK_SECRET not set, webhook signatures will not be verified");
    }

    // Initialize Redis
    let redis = create_redis_client(&config.redis_url).await?;

    // Log in to Discord; deliveries wait on the gate until the cache is ready
    let gate = ReadinessGate::new();
    let discord = DiscordSession::start(&config.discord_token, gate.clone()).await?;
    let dispatcher = Dispatcher::new(
        Arc::new(discord.platform.clone()),
        gate,
        config.chat_ready_timeout,
    );

    let tasks = BackgroundTasks::new();

    // Start the bus listener
    let source = RedisEventSource::subscribe(&redis, &config.event_channel).await?;
    let event_listener = EventListener::new(
        source,
        dispatcher.clone(),
        config.lab_channel_id,
        config.listener_poll,
    );
    tasks.spawn("event_listener", event_listener.run(tasks.cancellation()));

    // Build router
    let state = AppState::new(config.clone(), dispatcher, tasks.clone());
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "GitHub webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let abandoned = tasks.shutdown(config.shutdown_grace).await;
    if abandoned > 0 {
        warn!(abandoned, "In-flight deliveries dropped at shutdown");
    }
    discord.shutdown().await;
    if let Err(e) = redis.quit().await {
        warn!(error = %e, "Redis quit failed");
    }

    info!("Server shutdown complete");

    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Received shutdown signal, cleaning up...");
}
