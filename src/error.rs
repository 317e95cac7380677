//! Error types for the application.

use std::path::PathBuf;
use thiserror::Error;

/// Errors related to configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid admin id: {0:?}")]
    InvalidAdminId(String),
}

/// Errors related to the user directory storage.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// A single failed delivery. The transport's error text is preserved
/// verbatim so it can be reported back to an administrator.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct DeliveryError(pub String);

/// Errors produced while routing an inbound event.
///
/// Most variants become user-facing guidance text; `Unauthorized` is a
/// deliberate silent no-op so admin commands stay undiscoverable.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Broadcast needs text, or reply to a message to broadcast it")]
    EmptyBroadcast,

    #[error("Nothing to send: add text, or reply to a message to send it")]
    EmptyMessage,

    #[error("Usage: /send <user_id or name> <text>")]
    MissingTarget,

    #[error("No known user named {0:?}")]
    TargetResolution(String),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl RelayError {
    /// Text to show the event's sender, or `None` for a silent no-op.
    pub fn user_message(&self) -> Option<String> {
        match self {
            RelayError::Unauthorized => None,
            RelayError::Directory(_) => Some("Internal error, please try again later".to_string()),
            other => Some(other.to_string()),
        }
    }
}
