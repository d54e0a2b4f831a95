//! nfo-editor - NFO sidecar editing service
//!
//! Serves the codec, validator, batch engine, search and lookup mapping over
//! HTTP. Configuration comes from TOML (see `nfo_common::config`) with CLI and
//! environment overrides.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use nfo_common::config::load_config;
use nfo_common::logging::init_tracing;
use nfo_editor::AppState;

/// Command-line arguments for nfo-editor
#[derive(Parser, Debug)]
#[command(name = "nfo-editor")]
#[command(about = "NFO sidecar editor service")]
#[command(version)]
struct Args {
    /// Configuration file (overrides NFO_EDITOR_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "NFO_EDITOR_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "NFO_EDITOR_BIND")]
    bind: Option<String>,

    /// Restrict every requested path to this directory
    #[arg(long, env = "NFO_EDITOR_BROWSE_ROOT")]
    browse_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(root) = args.browse_root {
        config.browse_root = Some(root);
    }

    init_tracing(&config.logging);

    info!("Starting nfo-editor v{}", env!("CARGO_PKG_VERSION"));
    if let Some(root) = &config.browse_root {
        info!("Browse root: {}", root.display());
    }

    let state = AppState::from_config(&config).context("Failed to initialize batch engine")?;
    info!(
        workers = config.batch.max_workers,
        max_tasks = config.batch.max_concurrent_tasks,
        "Batch engine initialized"
    );

    let app = nfo_editor::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
