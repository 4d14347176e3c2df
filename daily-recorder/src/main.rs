//! Daily CLI - room, token, recording and webhook subscription tools.
//!
//! Thin commands over the provider REST API. The last room, recording and
//! token are remembered in a session file so follow-up commands can omit them.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{Cli, CliContext};
use dailyrec::{Config, DailyClient, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Human-readable logs on stderr; stdout carries command output
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    debug!(config = ?config, "config_loaded");

    let client = DailyClient::from_config(&config).context("Failed to create API client")?;
    let session = SessionStore::new(config.session_file.clone());

    let ctx = CliContext {
        config,
        client,
        session,
    };

    commands::run(cli.command, &ctx).await
}
