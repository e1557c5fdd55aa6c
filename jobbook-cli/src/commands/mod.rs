//! Command implementations for the jobbook CLI

pub mod init_db;
pub mod list;
pub mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use jobbook_server::db::{create_pool_with_options, DEFAULT_MAX_CONNECTIONS};
use jobbook_server::{BookingManager, PgRowStore};

pub use init_db::{run_init_db, InitDbArgs};
pub use list::{run_list, ListArgs};
pub use serve::{run_serve, ServeArgs};

/// Connection settings shared by every command that talks to PostgreSQL
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long, env = "JOBBOOK_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl DatabaseArgs {
    /// Build a booking manager over a lazily connected PostgreSQL pool.
    pub async fn connect(&self) -> Result<BookingManager> {
        let database_url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

        let pool = create_pool_with_options(database_url, self.max_connections)
            .await
            .context("Failed to create database pool")?;

        Ok(BookingManager::new(Arc::new(PgRowStore::new(pool))))
    }
}
