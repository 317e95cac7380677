//! Telegram message-relay bot library.
//!
//! Ordinary users write to the bot; every message is forwarded to a static
//! set of administrators, who can reply to a specific user, broadcast to
//! all known users, or send ad-hoc messages to arbitrary targets.

pub mod bot;
pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod messenger;
pub mod payload;
pub mod pending;
pub mod router;

// Re-export commonly used types
pub use config::Config;
pub use directory::{Directory, RecentUser};
pub use error::{ConfigError, DeliveryError, DirectoryError, RelayError};
pub use messenger::{send_many, DeliveryReport, Messenger};
pub use payload::Payload;
pub use pending::{PendingReplies, ReplyTarget};
pub use router::{Relay, Sender};
