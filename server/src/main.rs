//! Tailgram Server - Main Entry Point
//!
//! Receives Tailscale admin-console webhooks, verifies them, and relays
//! each event to a Telegram chat.

use anyhow::Result;
use tracing::info;

use tailgram_server::{api, config, telegram};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tailgram_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration (.env is honored for local development)
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.bind_address,
        "Starting Tailgram Server"
    );

    let notifier = telegram::TelegramNotifier::new(&config)?;
    info!(chat_id = %config.telegram_chat_id, "Telegram channel ready");

    // Build application state and router
    let state = api::AppState::new(config.clone(), notifier);
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
