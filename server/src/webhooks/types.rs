//! Webhook Types
//!
//! Intake errors and their HTTP mapping.

use axum::http::StatusCode;
use thiserror::Error;

/// Header carrying the HMAC signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Header carrying the GitHub event kind.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the GitHub delivery GUID.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Webhook intake errors, all raised before the event is accepted.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Missing signature")]
    MissingSignature,
    #[error("Signature mismatch")]
    SignatureMismatch,
    #[error("Invalid JSON payload")]
    InvalidJson,
}

impl From<WebhookError> for (StatusCode, String) {
    fn from(err: WebhookError) -> Self {
        let status = match err {
            WebhookError::MissingSignature | WebhookError::InvalidJson => StatusCode::BAD_REQUEST,
            WebhookError::SignatureMismatch => StatusCode::FORBIDDEN,
        };
        (status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (WebhookError::MissingSignature, StatusCode::BAD_REQUEST, "Missing signature"),
            (WebhookError::SignatureMismatch, StatusCode::FORBIDDEN, "Signature mismatch"),
            (WebhookError::InvalidJson, StatusCode::BAD_REQUEST, "Invalid JSON payload"),
        ];
        for (err, status, text) in cases {
            let (got_status, got_text): (StatusCode, String) = err.into();
            assert_eq!(got_status, status);
            assert_eq!(got_text, text);
        }
    }
}
