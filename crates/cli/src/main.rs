//! Kurort CLI — the main entry point.
//!
//! Commands:
//! - `onboard`    — Write a default config file
//! - `ask`        — Run one advisory request end to end
//! - `fetch-pois` — Warm the OpenStreetMap POI cache

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "kurort",
    about = "Kurort — travel-destination advisor for Russian resort cities",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Ask for a travel recommendation
    Ask {
        /// The request, e.g. "Хочу на море в августе"
        #[arg(short, long)]
        message: String,

        /// Print the full recommendation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch points of interest for every configured city
    FetchPois,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask { message, json } => commands::ask::run(&message, json).await?,
        Commands::FetchPois => commands::fetch_pois::run().await?,
    }

    Ok(())
}
