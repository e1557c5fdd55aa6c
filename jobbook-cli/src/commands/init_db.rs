//! Create the bookings table ahead of the first request

use anyhow::{Context, Result};
use clap::Parser;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct InitDbArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_init_db(args: InitDbArgs) -> Result<()> {
    let bookings = args.db.connect().await?;
    bookings.init().await.context("Failed to create bookings table")?;
    tracing::info!("Bookings table ready");
    Ok(())
}
