mod commands;
mod tracing_setup;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{InitDbArgs, ListArgs, ServeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "jobbook",
    author,
    version,
    about = "Date-grouped job bookings over PostgreSQL",
    long_about = "Serve the /bookings dispatcher endpoint, prepare the bookings table, \
                  and inspect stored bookings from the command line."
)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Create the bookings table if it does not exist
    InitDb(InitDbArgs),
    /// Print stored bookings grouped by date key
    List(ListArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_setup::init_tracing(cli.debug).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::InitDb(args) => commands::run_init_db(args).await?,
        Commands::List(args) => commands::run_list(args).await?,
    }
    Ok(())
}
