//! Tailscale Webhook Intake
//!
//! Signature verification with replay protection, event payload types, and
//! the `/events` endpoint handler.

pub mod handlers;
pub mod signature;
pub mod types;
