//! readsync server
//!
//! Local companion server for the browser reading extension.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use readsync_core::Config;

mod error;
mod handlers;
mod routes;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "readsync")]
#[command(about = "readsync - Companion server for the reading extension")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/readsync/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port of the extension listener
    #[arg(long)]
    port: Option<u16>,

    /// Port of the read-later API listener
    #[arg(long)]
    api_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(port) = cli.api_port {
        config.api_port = port;
    }

    init_logging(&config);

    if config.sync_path.is_none() {
        warn!("No sync_path configured; document endpoints will report an error status");
    }
    config.ensure_dirs()?;

    let state = AppState::from_config(&config)?;

    let local = bind(config.port).await?;
    let api = bind(config.api_port).await?;
    info!(
        "Listening on port {} (extension) and port {} (API)",
        config.port, config.api_port
    );

    let local_state = state.clone();
    tokio::try_join!(
        async {
            axum::serve(local, routes::local_router(local_state))
                .await
                .context("Extension listener failed")
        },
        async {
            axum::serve(api, routes::api_router(state))
                .await
                .context("API listener failed")
        },
    )?;

    Ok(())
}

/// Initialize logging to stderr, preferring RUST_LOG over the config
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))
}
