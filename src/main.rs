mod bot;
mod config;
mod error;
mod fetch;
mod parser;
mod report;
mod schedule;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::ReportError;

#[derive(Parser)]
#[command(name = "gpv_bot", about = "Power outage schedule bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot loop
    Run,
    /// Fetch the schedule once and print the report to stdout
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Run => bot::run(config).await,
        Commands::Report => {
            let client = reqwest::Client::new();
            match report::outage_report(&client, &config.schedule_url, &config.feeders).await {
                Ok(text) if text.is_empty() => println!("No outages scheduled."),
                Ok(text) => println!("{text}"),
                Err(ReportError::NotFound | ReportError::EmptyPayload) => {
                    println!("No schedule data on the page.")
                }
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
    }
}
