//! Telegram message-relay bot - process entry point.

mod bot;
mod cli;
mod config;
mod directory;
mod error;
mod messenger;
mod payload;
mod pending;
mod router;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config).context("Failed to load configuration")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    bot::run(config).await.context("Failed to run relay bot")?;

    Ok(())
}
