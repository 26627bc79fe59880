//! # rosterd
//!
//! Presence server binary — loads settings, builds the verifier and server,
//! and runs until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use roster_auth::TokenVerifier;
use roster_server::config::ServerConfig;
use roster_server::server::RosterServer;

/// Presence server.
#[derive(Parser, Debug)]
#[command(name = "rosterd", about = "Real-time presence server")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings if specified; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file (default `~/.roster/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Settings first: the log level default lives there.
    let settings_path = args
        .settings
        .unwrap_or_else(roster_settings::loader::settings_path);
    let settings = roster_settings::loader::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone())),
        )
        .init();

    if settings.auth.refresh_token_secret.is_empty() {
        bail!(
            "no refresh token secret configured; set SECRET_REFRESH_TOKEN or \
             auth.refreshTokenSecret in {}",
            settings_path.display()
        );
    }

    let mut config = ServerConfig::from(&settings.server);
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let verifier = TokenVerifier::new(&settings.auth.refresh_token_secret);
    let server = RosterServer::new(config, verifier);
    let (addr, handle) = server.listen().await.context("Failed to bind listener")?;
    tracing::info!(%addr, "rosterd started");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    tracing::info!("shutdown signal received");

    let drained = server
        .shutdown()
        .drain(server.registry(), Some(Duration::from_secs(10)))
        .await;
    if !drained {
        tracing::warn!("some connections did not close before the drain deadline");
    }
    handle.await.context("Server task failed")?;
    tracing::info!("rosterd stopped");
    Ok(())
}
