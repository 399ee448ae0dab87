//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::{config::Config, dispatch::Dispatcher, tasks::BackgroundTasks, webhooks};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Chat delivery handle
    pub dispatcher: Dispatcher,
    /// Tracked background work (webhook deliveries)
    pub tasks: BackgroundTasks,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(config: Config, dispatcher: Dispatcher, tasks: BackgroundTasks) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
            tasks,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.max_webhook_body;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // GitHub webhooks
        .route(
            "/github-webhook",
            post(webhooks::handlers::receive_github_webhook),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body))
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether the chat client has completed its handshake
    chat_ready: bool,
    /// Whether webhook signatures are verified
    signature_verification: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        chat_ready: state.dispatcher.is_ready(),
        signature_verification: state.config.verifies_signatures(),
    })
}
