//! Print stored bookings as JSON

use anyhow::{Context, Result};
use clap::Parser;

use jobbook_server::models::DateKey;

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only print the group for this date key (as an ordered array)
    #[arg(long, short = 'd')]
    pub date_key: Option<String>,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_list(args: ListArgs) -> Result<()> {
    let date_key = args.date_key.as_deref().map(DateKey::new).transpose()?;
    let bookings = args.db.connect().await?;

    let output = match date_key {
        Some(date_key) => {
            let group = bookings
                .list_group(&date_key)
                .await
                .context("Failed to read bookings")?;
            serde_json::to_string_pretty(&group)?
        }
        None => {
            let all = bookings.list().await.context("Failed to read bookings")?;
            serde_json::to_string_pretty(&all)?
        }
    };

    println!("{}", output);
    Ok(())
}
