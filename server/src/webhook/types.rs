//! Webhook Types
//!
//! Event payloads as delivered by the Tailscale admin console, plus the
//! request-level error taxonomy for the intake endpoint.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A single event from a Tailscale webhook delivery.
///
/// `version` is absent from some payloads, and `data` carries arbitrary
/// event-specific JSON (node IDs, actor emails, expiring keys). Unknown
/// top-level fields are ignored so new admin-console fields do not break
/// intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailscaleEvent {
    /// When the event occurred, per Tailscale.
    pub timestamp: DateTime<Utc>,
    /// Payload schema version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    /// Event category, e.g. `nodeCreated` or `policyUpdate`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Tailnet the event belongs to.
    pub tailnet: String,
    /// Human-readable summary.
    pub message: String,
    /// Event-specific details.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
}

/// Request body of a webhook delivery.
///
/// Tailscale batches events into a JSON array; a single bare event object is
/// accepted as a convenience for manual testing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EventEnvelope {
    Batch(Vec<TailscaleEvent>),
    Single(TailscaleEvent),
}

impl EventEnvelope {
    /// Normalize the envelope to a list of events.
    #[must_use]
    pub fn into_events(self) -> Vec<TailscaleEvent> {
        match self {
            Self::Batch(events) => events,
            Self::Single(event) => vec![event],
        }
    }
}

/// Webhook intake errors. Every variant is terminal for the request; nothing
/// is retried on this side.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header missing, unparseable, or not matching the computed
    /// value. The response never says which.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Header timestamp outside the replay window, in either direction.
    #[error("Webhook timestamp outside the accepted window")]
    StaleOrFutureTimestamp,

    /// Body failed to parse after the signature checked out.
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Telegram refused or never received a verified notification. Carries
    /// the request id so the caller can correlate with server logs.
    #[error("Failed to deliver notification")]
    DeliveryFailed { request_id: Uuid },
}

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidSignature => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
            Self::StaleOrFutureTimestamp => (StatusCode::UNAUTHORIZED, "STALE_TIMESTAMP"),
            Self::MalformedPayload(_) => (StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD"),
            Self::DeliveryFailed { .. } => (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED"),
        };

        let request_id = match &self {
            Self::DeliveryFailed { request_id } => Some(*request_id),
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
            request_id,
        });

        match request_id {
            Some(id) => (status, [("x-request-id", id.to_string())], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Correlation id, present once the request has been assigned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
}

/// Success response for `POST /events`.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    /// Always `"accepted"`.
    pub status: &'static str,
    /// Delivery summary.
    pub message: String,
    /// Correlation id, also returned in the `X-Request-ID` header.
    pub request_id: Uuid,
}
