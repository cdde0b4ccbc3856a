//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;

use crate::webhook::signature::REPLAY_WINDOW_SECS;

/// Default Telegram Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8000")
    pub bind_address: String,

    /// Shared secret from the Tailscale webhook configuration
    pub tailscale_webhook_secret: String,

    /// Maximum accepted age of a webhook timestamp, in seconds (default: 300)
    pub webhook_timestamp_tolerance_secs: i64,

    /// Telegram bot token from `@BotFather`
    pub telegram_bot_token: String,

    /// Target chat id (numeric id or `@channelname`)
    pub telegram_chat_id: String,

    /// Telegram Bot API base URL (overridable for tests and proxies)
    pub telegram_api_base: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".into()),
            tailscale_webhook_secret: env::var("TAILSCALE_WEBHOOK_SECRET")
                .context("TAILSCALE_WEBHOOK_SECRET must be set")?,
            webhook_timestamp_tolerance_secs: env::var("WEBHOOK_TIMESTAMP_TOLERANCE_SECS")
                .ok()
                .map_or(REPLAY_WINDOW_SECS, |v| {
                    v.parse().unwrap_or_else(|_| {
                        tracing::warn!(
                            value = %v,
                            default = REPLAY_WINDOW_SECS,
                            "Invalid WEBHOOK_TIMESTAMP_TOLERANCE_SECS, using default"
                        );
                        REPLAY_WINDOW_SECS
                    })
                }),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID")
                .context("TELEGRAM_CHAT_ID must be set")?,
            telegram_api_base: env::var("TELEGRAM_API_BASE")
                .unwrap_or_else(|_| TELEGRAM_API_BASE.into()),
        })
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".into(),
            tailscale_webhook_secret: "test-webhook-secret".into(),
            webhook_timestamp_tolerance_secs: REPLAY_WINDOW_SECS,
            telegram_bot_token: "000000:test-bot-token".into(),
            telegram_chat_id: "-1000000000000".into(),
            telegram_api_base: TELEGRAM_API_BASE.into(),
        }
    }
}
