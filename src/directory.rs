//! Persistent user directory.
//!
//! Append-only SQLite log of every inbound user message. "Distinct users"
//! is computed at query time by user id, most recent row wins; that keeps
//! display names current without reconciling old rows.

use crate::error::DirectoryError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    username TEXT,
    message_id INTEGER NOT NULL,
    text TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// Default limit for [`Directory::list_recent_users`].
pub const RECENT_USERS_LIMIT: i64 = 50;

/// A distinct user with their most recently seen display name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RecentUser {
    pub user_id: i64,
    pub display_name: Option<String>,
}

/// Handle to the user directory storage.
#[derive(Debug, Clone)]
pub struct Directory {
    pool: SqlitePool,
}

impl Directory {
    /// Open (creating if necessary) the directory database at `path`.
    pub async fn open(path: &Path) -> Result<Self, DirectoryError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let directory = Self::new(pool);
        directory.init_schema().await?;
        Ok(directory)
    }

    /// Wrap an existing pool without touching the schema.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the messages table if it does not exist yet.
    pub async fn init_schema(&self) -> Result<(), DirectoryError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Append one inbound message row.
    pub async fn record(
        &self,
        user_id: i64,
        display_name: Option<&str>,
        message_id: i32,
        text: &str,
    ) -> Result<(), DirectoryError> {
        sqlx::query("INSERT INTO messages (user_id, username, message_id, text) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(display_name)
            .bind(message_id)
            .bind(text)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Most recently active distinct users, newest first. The display name
    /// comes from each user's latest row.
    pub async fn list_recent_users(&self, limit: i64) -> Result<Vec<RecentUser>, DirectoryError> {
        let users = sqlx::query_as::<_, RecentUser>(
            "SELECT user_id, username AS display_name FROM messages \
             WHERE id IN (SELECT MAX(id) FROM messages GROUP BY user_id) \
             ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// The user id most recently seen under `name`, if any.
    pub async fn find_user_id_by_display_name(
        &self,
        name: &str,
    ) -> Result<Option<i64>, DirectoryError> {
        let user_id = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM messages WHERE username = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_id)
    }

    /// Every distinct user id ever recorded; the broadcast recipient set.
    pub async fn list_all_user_ids(&self) -> Result<Vec<i64>, DirectoryError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT DISTINCT user_id FROM messages")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
