//! API Router and Application State

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::telegram::TelegramNotifier;
use crate::webhook;

/// Webhook bodies are small; cap them well below axum's default.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Telegram notification channel
    pub notifier: TelegramNotifier,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(config: Config, notifier: TelegramNotifier) -> Self {
        Self {
            config: Arc::new(config),
            notifier,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(webhook::handlers::receive_events))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
