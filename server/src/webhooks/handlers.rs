//! Webhook API Handlers
//!
//! `POST /github-webhook`. Verification and parsing happen inline; rendering
//! and delivery run after the response on the background task group.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use tracing::{debug, field, info, instrument, warn, Span};

use super::signing;
use super::types::{WebhookError, DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};
use crate::api::AppState;
use crate::dispatch::{DeliveryOutcome, Dispatcher};
use crate::events::{FormattedNotification, GithubEventKind, InboundWebhookEvent};

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Authenticate and parse a raw delivery.
///
/// With a secret configured the signature header is mandatory. Without one,
/// verification is skipped entirely.
pub fn accept_delivery(
    secret: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<InboundWebhookEvent, WebhookError> {
    let signature = headers.get(SIGNATURE_HEADER);

    if let Some(secret) = secret {
        let provided = signature.ok_or(WebhookError::MissingSignature)?;
        let provided = provided
            .to_str()
            .map_err(|_| WebhookError::SignatureMismatch)?;
        if !signing::verify_signature(secret, body, provided) {
            return Err(WebhookError::SignatureMismatch);
        }
    }

    let payload: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| WebhookError::InvalidJson)?;

    let kind = header_str(headers, EVENT_HEADER)
        .map(GithubEventKind::parse_str)
        .unwrap_or_default();

    Ok(InboundWebhookEvent {
        kind,
        payload,
        signature: signature
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        delivery_id: header_str(headers, DELIVERY_HEADER).map(str::to_string),
    })
}

/// POST /github-webhook
#[instrument(
    skip(state, headers, body),
    fields(event_kind = field::Empty, delivery_id = field::Empty)
)]
pub async fn receive_github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), (StatusCode, String)> {
    let event = accept_delivery(state.config.webhook_secret.as_deref(), &headers, &body)
        .inspect_err(|e| warn!(error = %e, "Rejected webhook delivery"))?;

    let span = Span::current();
    span.record("event_kind", event.kind.as_str());
    if let Some(delivery_id) = &event.delivery_id {
        span.record("delivery_id", delivery_id.as_str());
    }
    debug!("Accepted webhook delivery");

    let dispatcher = state.dispatcher.clone();
    let channel_id = state.config.github_channel_id;
    state
        .tasks
        .spawn("github_webhook", relay_event(dispatcher, channel_id, event));

    Ok((StatusCode::OK, "OK"))
}

/// Render an accepted event and deliver it to the integrations channel.
///
/// Failures are logged once, by the dispatcher.
pub async fn relay_event(dispatcher: Dispatcher, channel_id: u64, event: InboundWebhookEvent) {
    let text = event.render();

    let outcome = dispatcher
        .deliver(FormattedNotification::new(channel_id, text))
        .await;
    if outcome == DeliveryOutcome::Sent {
        info!(
            event_kind = %event.kind,
            delivery_id = event.delivery_id.as_deref().unwrap_or_default(),
            channel_id,
            "Posted GitHub event"
        );
    }
}
