//! Pending-reply tracker.
//!
//! Transient per-administrator memory of "who am I replying to right now".
//! One slot per administrator; a new selection overwrites the old one, and
//! the slot is consumed exactly once when the administrator next sends
//! content. Not persisted: lost on restart, the administrator re-initiates.

use std::collections::HashMap;
use tokio::sync::Mutex;

/// The user (and optionally the message) an administrator is replying to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTarget {
    pub user_id: i64,
    /// Original message id, used as a reply-to hint when present.
    pub message_id: Option<i32>,
}

/// In-memory map from administrator id to their current reply target.
#[derive(Debug, Default)]
pub struct PendingReplies {
    slots: Mutex<HashMap<i64, ReplyTarget>>,
}

impl PendingReplies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) the reply target for an administrator.
    pub async fn begin(&self, admin_id: i64, target: ReplyTarget) {
        self.slots.lock().await.insert(admin_id, target);
    }

    /// Atomically read and delete the administrator's slot. The lock is
    /// held across the read-then-delete, so rapid repeated triggers by the
    /// same administrator cannot observe the entry twice.
    pub async fn take(&self, admin_id: i64) -> Option<ReplyTarget> {
        self.slots.lock().await.remove(&admin_id)
    }
}
