//! Tailgram Server
//!
//! Receives Tailscale admin-console webhooks, verifies their HMAC-SHA256
//! signature and freshness, and relays each event to a Telegram chat.

pub mod api;
pub mod config;
pub mod telegram;
pub mod webhook;
