//! HMAC-SHA256 Webhook Signing
//!
//! Verifies `X-Hub-Signature-256` values (`sha256=<hex>`) against the raw body.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Sign a payload with HMAC-SHA256 and return the hex-encoded signature.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    hex::encode(mac_for(secret, payload).finalize().into_bytes())
}

/// Build the full header value (`sha256=<hex>`) for a payload.
pub fn signature_header(secret: &str, payload: &[u8]) -> String {
    format!("{SIGNATURE_PREFIX}{}", sign_payload(secret, payload))
}

/// Verify a `sha256=<hex>` header value against a payload.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str) -> bool {
    let expected = signature_header(secret, payload);
    // Constant-time comparison
    expected.len() == header.len()
        && expected
            .as_bytes()
            .iter()
            .zip(header.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn mac_for(secret: &str, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    mac
}
