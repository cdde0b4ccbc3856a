//! Dev utility: sign and send a sample webhook delivery to a running server.
//!
//! Usage: `cargo run --example send_test_event [host:port]`
//!
//! Reads `TAILSCALE_WEBHOOK_SECRET` from the environment (or `.env`) and
//! posts a signed `nodeCreated` event to `http://host:port/events`
//! (default `localhost:8000`).

use chrono::Utc;
use serde_json::json;

use tailgram_server::webhook::signature::{sign_payload, SIGNATURE_HEADER};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "localhost:8000".to_string());
    let secret = std::env::var("TAILSCALE_WEBHOOK_SECRET")
        .expect("TAILSCALE_WEBHOOK_SECRET must be set (environment or .env)");

    let payload = json!([{
        "timestamp": Utc::now().to_rfc3339(),
        "version": 1,
        "type": "nodeCreated",
        "tailnet": "example.com",
        "message": "Node created: my-laptop",
        "data": {
            "actor": "user@example.com",
            "nodeID": "12345",
            "nodeName": "my-laptop",
        }
    }]);
    let body = serde_json::to_vec(&payload).expect("Failed to serialize sample event");

    let timestamp = Utc::now().timestamp();
    let signature = sign_payload(&secret, timestamp, &body);

    let response = reqwest::Client::new()
        .post(format!("http://{endpoint}/events"))
        .header(SIGNATURE_HEADER, format!("t={timestamp},v1={signature}"))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Request failed; is the server running?");

    println!("HTTP {}", response.status());
    println!("{}", response.text().await.unwrap_or_default());
}
