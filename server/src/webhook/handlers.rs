//! Webhook API Handlers
//!
//! The intake endpoint: verify the delivery, then fan events out to
//! Telegram. Verification failures never reveal the expected signature.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::signature::{self, SIGNATURE_HEADER};
use super::types::{AcceptedResponse, WebhookError, WebhookResult};
use crate::api::AppState;

/// POST `/events`
///
/// The body is taken as raw bytes so the signature covers exactly what was
/// sent on the wire; JSON parsing happens only after verification.
#[instrument(skip(state, headers, body))]
pub async fn receive_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResult<([(&'static str, String); 1], Json<AcceptedResponse>)> {
    let request_id = Uuid::new_v4();

    let signature_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            warn!(%request_id, "Rejected delivery without a usable signature header");
            WebhookError::InvalidSignature
        })?;

    let events = signature::verify(
        &body,
        signature_header,
        &state.config.tailscale_webhook_secret,
        Utc::now(),
        state.config.webhook_timestamp_tolerance_secs,
    )
    .inspect_err(|err| {
        warn!(%request_id, error = %err, "Rejected webhook delivery");
    })?;

    info!(%request_id, count = events.len(), "Verified webhook delivery");

    // Every event gets exactly one delivery attempt, even after an earlier
    // one in the batch has failed.
    let mut failed = 0usize;
    for event in &events {
        match state.notifier.send(event).await {
            Ok(()) => {
                info!(
                    %request_id,
                    event_type = %event.event_type,
                    tailnet = %event.tailnet,
                    "Forwarded event to Telegram"
                );
            }
            Err(err) => {
                failed += 1;
                error!(
                    %request_id,
                    event_type = %event.event_type,
                    error = %err,
                    "Telegram delivery failed"
                );
            }
        }
    }

    if failed > 0 {
        return Err(WebhookError::DeliveryFailed { request_id });
    }

    let count = events.len();
    Ok((
        [("x-request-id", request_id.to_string())],
        Json(AcceptedResponse {
            status: "accepted",
            message: format!("Processed {count} event(s)"),
            request_id,
        }),
    ))
}
