//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router, backed by an in-memory chat platform that records every send.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use hookrelay_server::api::{create_router, AppState};
use hookrelay_server::config::Config;
use hookrelay_server::dispatch::{ChannelTarget, ChatError, ChatPlatform, Dispatcher, ReadinessGate};
use hookrelay_server::tasks::BackgroundTasks;

// ============================================================================
// Recording chat platform
// ============================================================================

/// Chat platform double that knows a fixed set of channels.
#[derive(Default)]
pub struct RecordingPlatform {
    channels: HashSet<u64>,
    sent: Mutex<Vec<(u64, String)>>,
}

impl RecordingPlatform {
    pub fn with_channels(ids: &[u64]) -> Self {
        Self {
            channels: ids.iter().copied().collect(),
            sent: Mutex::default(),
        }
    }

    /// Messages sent so far as `(channel_id, text)`.
    pub fn sent(&self) -> Vec<(u64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn resolve_channel(&self, channel_id: u64) -> Option<ChannelTarget> {
        self.channels.contains(&channel_id).then(|| ChannelTarget {
            id: channel_id,
            name: format!("channel-{channel_id}"),
        })
    }

    async fn send(&self, target: &ChannelTarget, text: &str) -> Result<(), ChatError> {
        self.sent.lock().unwrap().push((target.id, text.to_string()));
        Ok(())
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub config: Config,
    pub platform: Arc<RecordingPlatform>,
    pub gate: ReadinessGate,
    pub tasks: BackgroundTasks,
}

impl TestApp {
    /// Create a test app with a ready chat client and both channels known.
    pub fn new() -> Self {
        Self::with_config(Config::default_for_test())
    }

    /// Create a test app with a custom config.
    pub fn with_config(config: Config) -> Self {
        let platform = Arc::new(RecordingPlatform::with_channels(&[
            config.github_channel_id,
            config.lab_channel_id,
        ]));
        Self::build(config, platform, true)
    }

    /// Create a test app from parts; `ready` controls the readiness gate.
    pub fn build(config: Config, platform: Arc<RecordingPlatform>, ready: bool) -> Self {
        let gate = ReadinessGate::new();
        if ready {
            gate.mark_ready();
        }
        let dispatcher = Dispatcher::new(platform.clone(), gate.clone(), config.chat_ready_timeout);
        let tasks = BackgroundTasks::new();
        let router = create_router(AppState::new(config.clone(), dispatcher, tasks.clone()));

        Self {
            router,
            config,
            platform,
            gate,
            tasks,
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Wait for background deliveries to finish.
    pub async fn drain(&self) {
        let abandoned = self.tasks.shutdown(Duration::from_secs(5)).await;
        assert_eq!(abandoned, 0, "background deliveries did not finish");
    }
}

// ============================================================================
// Request & response helpers
// ============================================================================

/// Build a `POST /github-webhook` request, signing the body when `secret` is set.
pub fn webhook_request(event: Option<&str>, body: &[u8], secret: Option<&str>) -> Request<Body> {
    let mut builder = TestApp::request(Method::POST, "/github-webhook")
        .header("Content-Type", "application/json")
        .header("X-GitHub-Delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    if let Some(event) = event {
        builder = builder.header("X-GitHub-Event", event);
    }
    if let Some(secret) = secret {
        builder = builder.header(
            "X-Hub-Signature-256",
            hookrelay_server::webhooks::signing::signature_header(secret, body),
        );
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

/// Collect a response body as a UTF-8 string.
pub async fn body_to_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Collect a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
