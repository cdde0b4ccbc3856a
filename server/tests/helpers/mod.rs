//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router, a signed-request builder, and an in-process mock of the Telegram
//! Bot API that records every `sendMessage` call.
//!
//! ## Test Servers
//!
//! Use [`spawn_test_server()`] when a test needs a real listener for
//! reqwest-based requests instead of `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{self, Method, Request, Response, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use tailgram_server::api::{create_router, AppState};
use tailgram_server::config::Config;
use tailgram_server::telegram::TelegramNotifier;
use tailgram_server::webhook::signature::{sign_payload, SIGNATURE_HEADER};

// ============================================================================
// Mock Telegram Bot API
// ============================================================================

/// One captured `sendMessage` call.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct SendMessageCall {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: String,
}

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<SendMessageCall>>>,
    remaining_failures: Arc<Mutex<usize>>,
}

/// Handle to an in-process mock of the Telegram Bot API.
///
/// Records the payload of every successful `sendMessage` call; the first
/// `failures` calls are answered with HTTP 500 and not recorded.
#[derive(Clone)]
pub struct MockTelegram {
    /// Base URL to use as `TELEGRAM_API_BASE`.
    pub url: String,
    calls: Arc<Mutex<Vec<SendMessageCall>>>,
    _handle: Arc<JoinHandle<()>>,
}

impl MockTelegram {
    /// Spawn the mock on a random port.
    pub async fn spawn(failures: usize) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            calls: calls.clone(),
            remaining_failures: Arc::new(Mutex::new(failures)),
        };

        let router = Router::new()
            .route("/bot{token}/sendMessage", post(mock_send_message))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock Telegram server");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Mock Telegram server failed");
        });

        Self {
            url,
            calls,
            _handle: Arc::new(handle),
        }
    }

    /// Calls recorded so far, in delivery order.
    pub fn calls(&self) -> Vec<SendMessageCall> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }
}

async fn mock_send_message(
    State(state): State<MockState>,
    Path(_token): Path<String>,
    Json(call): Json<SendMessageCall>,
) -> (StatusCode, Json<serde_json::Value>) {
    {
        let mut remaining = state
            .remaining_failures
            .lock()
            .expect("failure counter poisoned");
        if *remaining > 0 {
            *remaining -= 1;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"ok": false, "description": "Internal Server Error"})),
            );
        }
    }

    state
        .calls
        .lock()
        .expect("mock call log poisoned")
        .push(call);

    (
        StatusCode::OK,
        Json(serde_json::json!({"ok": true, "result": {"message_id": 1}})),
    )
}

// ============================================================================
// TestApp
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub config: Arc<Config>,
    pub telegram: MockTelegram,
}

impl TestApp {
    /// Create a test app whose notifier points at a fresh mock Telegram.
    pub async fn new() -> Self {
        Self::with_telegram_failures(0).await
    }

    /// Create a test app whose mock Telegram answers the first `failures`
    /// calls with HTTP 500.
    pub async fn with_telegram_failures(failures: usize) -> Self {
        let telegram = MockTelegram::spawn(failures).await;

        let mut config = Config::default_for_test();
        config.telegram_api_base = telegram.url.clone();

        let notifier =
            TelegramNotifier::new(&config).expect("Failed to build Telegram notifier");
        let state = AppState::new(config.clone(), notifier);
        let router = create_router(state);

        Self {
            router,
            config: Arc::new(config),
            telegram,
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

    /// POST a body to `/events` with the given signature header.
    pub async fn post_events(&self, body: &[u8], signature_header: &str) -> Response<Body> {
        let request = Self::request(Method::POST, "/events")
            .header(SIGNATURE_HEADER, signature_header)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_vec()))
            .expect("Failed to build request");
        self.oneshot(request).await
    }

    /// POST a body to `/events`, signed at the current time with this app's
    /// webhook secret.
    pub async fn post_signed_events(&self, body: &[u8]) -> Response<Body> {
        let header = self.signed_header_at(chrono::Utc::now().timestamp(), body);
        self.post_events(body, &header).await
    }

    /// Build a `t=...,v1=...` header for `body` signed at `timestamp`.
    pub fn signed_header_at(&self, timestamp: i64, body: &[u8]) -> String {
        let signature = sign_payload(&self.config.tailscale_webhook_secret, timestamp, body);
        format!("t={timestamp},v1={signature}")
    }
}

// ============================================================================
// Test server harness
// ============================================================================

/// A running HTTP test server.
pub struct TestServer {
    /// Server address (127.0.0.1:PORT).
    pub addr: SocketAddr,
    /// Base URL for HTTP requests (e.g., `http://127.0.0.1:12345`).
    pub url: String,
    /// Handle to the server task for cleanup.
    _handle: JoinHandle<()>,
}

/// Spawn a real HTTP server on a random port.
pub async fn spawn_test_server(router: Router) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    TestServer {
        addr,
        url,
        _handle: handle,
    }
}

// ============================================================================
// Response utilities
// ============================================================================

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Response body is not valid JSON ({e}): {preview}")
    })
}

/// A well-formed single-event body matching the admin-console payload shape.
pub fn sample_event_body() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "timestamp": "2026-02-15T09:33:14Z",
        "version": 1,
        "type": "nodeCreated",
        "tailnet": "example.com",
        "message": "Node created: my-laptop",
        "data": {
            "actor": "user@example.com",
            "nodeID": "12345",
            "nodeName": "my-laptop",
        }
    }))
    .expect("Failed to serialize sample event")
}
