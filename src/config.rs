//! Configuration for the relay bot.
//!
//! Loads from a JSON file when one is given on the command line, otherwise
//! from environment variables (with a best-effort `.env` load via dotenvy):
//! `BOT_TOKEN`, `ADMIN_IDS` (comma-separated), `DATABASE_PATH`.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default SQLite database path, relative to the working directory.
pub fn default_database_path() -> PathBuf {
    PathBuf::from("relay.db")
}

/// JSON configuration file structure.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    bot_token: String,
    admin_ids: Vec<i64>,
    #[serde(default)]
    database_path: Option<PathBuf>,
}

/// Application configuration, read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot API token.
    pub bot_token: String,
    /// Static administrator allow-list.
    pub admin_ids: HashSet<i64>,
    /// Path to the SQLite user directory.
    pub database_path: PathBuf,
}

impl Config {
    /// Load configuration from a JSON file if a path is given, otherwise
    /// from environment variables.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::from_json(&path),
            None => Self::from_env(),
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&content)?;

        if file.bot_token.is_empty() {
            return Err(ConfigError::MissingField("bot_token".to_string()));
        }
        if file.admin_ids.is_empty() {
            return Err(ConfigError::MissingField("admin_ids".to_string()));
        }

        Ok(Self {
            bot_token: file.bot_token,
            admin_ids: file.admin_ids.into_iter().collect(),
            database_path: file.database_path.unwrap_or_else(default_database_path),
        })
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Silently ignore a missing .env file
        let _ = dotenvy::dotenv();

        let token = env::var("BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("BOT_TOKEN".to_string()))?;

        let admin_ids_raw = env::var("ADMIN_IDS")
            .map_err(|_| ConfigError::MissingEnvVar("ADMIN_IDS".to_string()))?;
        let admin_ids = parse_admin_ids(&admin_ids_raw)?;
        if admin_ids.is_empty() {
            return Err(ConfigError::MissingField("ADMIN_IDS".to_string()));
        }

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_database_path());

        Ok(Self {
            bot_token: token,
            admin_ids,
            database_path,
        })
    }
}

/// Parse a comma-separated administrator id list. Empty entries are
/// skipped; non-numeric entries are an error.
fn parse_admin_ids(raw: &str) -> Result<HashSet<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidAdminId(entry.to_string()))
        })
        .collect()
}
