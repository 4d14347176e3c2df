//! Daily Webhook Receiver - signed recording event listener.
//!
//! This binary:
//! - Verifies HMAC signatures on provider callbacks
//! - Classifies recording started/ready/error events
//! - Enriches ready events with download and access links
//! - Appends every event to the append-only event log
//!
//! Shutdown on SIGINT/SIGTERM is immediate; in-flight requests are not drained.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dailyrec::webhook::router;
use dailyrec::{AppState, Config, DailyClient, EventLog};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("webhook_server_starting");

    // Missing API key is fatal before anything binds
    let config = Config::from_env().context("Failed to load configuration")?;
    let verification_enabled = config.verification_enabled();
    info!(
        port = config.port,
        log_file = %config.log_file.display(),
        api_url = %config.api_url,
        signature_verification = verification_enabled,
        access_link_valid_secs = config.access_link_valid_secs,
        "config_loaded"
    );

    let client = DailyClient::from_config(&config).context("Failed to create API client")?;
    let event_log = EventLog::open(&config.log_file)
        .await
        .with_context(|| format!("Failed to open event log {}", config.log_file.display()))?;

    let port = config.port;
    let state = AppState::new(config, Arc::new(client), event_log.clone());
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "webhook_server_listening");
    event_log
        .append(&format!(
            "SERVER STARTED | Port: {} | Log: {} | Signature verification: {}",
            port,
            event_log.path().display(),
            if verification_enabled { "enabled" } else { "disabled (unverified mode)" }
        ))
        .await;

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.context("Server error")?;
        }
        _ = shutdown_signal() => {}
    }

    event_log.append("SERVER SHUTDOWN").await;
    info!("webhook_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("webhook_server_shutting_down");
}
