//! Telegram Notification Channel
//!
//! Formats verified Tailscale events and delivers them through the Bot API
//! `sendMessage` method. One outbound call per event, no retries.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::webhook::types::TailscaleEvent;

/// Longest rendered detail value; anything longer is cut to 97 characters
/// plus `...`.
const MAX_DETAIL_CHARS: usize = 100;

/// Timeout for a single `sendMessage` call.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram delivery channel for webhook notifications.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    /// Create a new notifier from server configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            client,
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
            api_base: config.telegram_api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Deliver one event to the configured chat.
    ///
    /// The bot token only ever appears in the request URL, never in logs or
    /// errors.
    pub async fn send(&self, event: &TailscaleEvent) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": format_message(event),
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .context("Telegram API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error: {status} - {body}");
        }

        debug!(event_type = %event.event_type, "Telegram notification sent");
        Ok(())
    }
}

/// Render an event as a Telegram HTML message.
fn format_message(event: &TailscaleEvent) -> String {
    let mut lines = vec![
        "🔔 <b>Tailscale Event</b>".to_string(),
        String::new(),
        format!("<b>Type:</b> <code>{}</code>", escape_html(&event.event_type)),
        format!("<b>Tailnet:</b> {}", escape_html(&event.tailnet)),
        format!("<b>Message:</b> {}", escape_html(&event.message)),
        format!("<b>Time:</b> {}", event.timestamp.to_rfc3339()),
    ];

    if !event.data.is_empty() {
        lines.push(String::new());
        lines.push("<b>Details:</b>".to_string());
        for (key, value) in &event.data {
            lines.push(format!(
                "  {}: <code>{}</code>",
                escape_html(key),
                escape_html(&detail_value(value))
            ));
        }
    }

    lines.join("\n")
}

/// Escape the characters Telegram's HTML parse mode treats specially.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render a detail value as display text, truncated to [`MAX_DETAIL_CHARS`].
fn detail_value(value: &serde_json::Value) -> String {
    let rendered = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if rendered.chars().count() > MAX_DETAIL_CHARS {
        let truncated: String = rendered.chars().take(MAX_DETAIL_CHARS - 3).collect();
        format!("{truncated}...")
    } else {
        rendered
    }
}
