//! HTTP server command
//!
//! Runs the /bookings dispatcher against PostgreSQL, or against the
//! in-memory store with `--memory`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use jobbook_server::{run_server, BookingManager, MemoryRowStore, ServerConfig};

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: JOBBOOK_BIND or 127.0.0.1:3040)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Keep bookings in process memory instead of PostgreSQL (lost on exit)
    #[arg(long)]
    pub memory: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = ServerConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    config.cors_permissive |= args.cors_permissive;

    let bookings = if args.memory {
        tracing::warn!("Using in-memory store; bookings are lost on shutdown");
        BookingManager::new(Arc::new(MemoryRowStore::new()))
    } else {
        args.db.connect().await?
    };

    tracing::info!("Starting jobbook server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(Arc::new(bookings), config)
        .await
        .context("Server error")?;

    Ok(())
}
