//! Webhook Signature Verification
//!
//! Tailscale signs each delivery with the `Tailscale-Webhook-Signature`
//! header, `t=<unix-seconds>,v1=<hex-hmac>`, where the signature is
//! HMAC-SHA256 over `"{t}.{body}"` keyed with the shared secret. Requests
//! are checked in a fixed order: header shape, then timestamp freshness,
//! then signature match, and only then is the body parsed.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::types::{EventEnvelope, TailscaleEvent, WebhookError, WebhookResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the timestamp and signature of a delivery.
pub const SIGNATURE_HEADER: &str = "Tailscale-Webhook-Signature";

/// Maximum accepted distance, in either direction, between the header
/// timestamp and the server clock.
pub const REPLAY_WINDOW_SECS: i64 = 300;

/// Compute the hex-encoded HMAC-SHA256 signature for a request body.
///
/// The signed content is the decimal timestamp, a literal `.`, and the raw
/// body bytes exactly as received.
#[must_use]
pub fn sign_payload(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a webhook delivery and parse its events.
///
/// `now` is passed in rather than read from the clock so the check is a pure
/// function of its arguments. On success the body is normalized to a list of
/// events; Tailscale sends an array, but a single bare event object is
/// accepted too.
pub fn verify(
    body: &[u8],
    signature_header: &str,
    secret: &str,
    now: DateTime<Utc>,
    tolerance_secs: i64,
) -> WebhookResult<Vec<TailscaleEvent>> {
    let (timestamp, supplied) =
        parse_signature_header(signature_header).ok_or(WebhookError::InvalidSignature)?;

    // Timestamp is checked before the signature: a replayed request is
    // rejected as stale even when its signature is garbage. The distance is
    // taken in u64 so a hostile `t` near i64::MIN cannot overflow.
    if now.timestamp().abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(WebhookError::StaleOrFutureTimestamp);
    }

    let expected = sign_payload(secret, timestamp, body);
    if !constant_time_eq(&expected, supplied) {
        return Err(WebhookError::InvalidSignature);
    }

    // Only an authenticated body is worth parsing.
    let envelope: EventEnvelope = serde_json::from_slice(body)?;
    Ok(envelope.into_events())
}

/// Parse a `t=<unix-seconds>,v1=<hex>` header value.
///
/// Parts other than `t=` and `v1=` (a future `v2=`, say) are ignored; both
/// required parts must be present and `t` must be a decimal integer.
fn parse_signature_header(header: &str) -> Option<(i64, &str)> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        if let Some(value) = part.strip_prefix("t=") {
            timestamp = value.parse::<i64>().ok();
        } else if let Some(value) = part.strip_prefix("v1=") {
            signature = Some(value);
        }
    }

    Some((timestamp?, signature?))
}

/// Compare two signature strings in constant time.
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
