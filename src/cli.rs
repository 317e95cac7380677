//! CLI argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Telegram message-relay bot.
///
/// One long-running process: forwards user messages to the configured
/// administrators and routes their replies back.
#[derive(Parser)]
#[command(name = "telegram-relay-bot")]
#[command(about = "Relay user messages to administrators and route replies back")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON configuration file (otherwise environment variables are used)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the SQLite database path
    #[arg(long)]
    pub database: Option<PathBuf>,
}
