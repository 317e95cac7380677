//! The relay core.
//!
//! Classifies each inbound event (admin vs. ordinary user, command vs. free
//! content vs. button press) and dispatches the matching outbound action.
//! All outbound traffic goes through the [`Messenger`] trait so every path
//! here is exercisable without a live transport.

use crate::directory::{Directory, RECENT_USERS_LIMIT};
use crate::error::RelayError;
use crate::messenger::telegram::REPLY_CALLBACK_PREFIX;
use crate::messenger::{send_many, Messenger};
use crate::payload::{Payload, UNKNOWN_CONTENT};
use crate::pending::{PendingReplies, ReplyTarget};
use std::collections::HashSet;

/// Identity of the inbound event's sender.
#[derive(Debug, Clone)]
pub struct Sender {
    pub id: i64,
    pub display_name: Option<String>,
}

impl Sender {
    fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or("no name")
    }
}

/// Parse the reply-button callback data `reply_<user_id>_<message_id>`.
/// Returns `None` for anything that does not match the shape exactly.
fn parse_reply_callback(data: &str) -> Option<(i64, i32)> {
    let rest = data.strip_prefix(REPLY_CALLBACK_PREFIX)?;
    let (user_id, message_id) = rest.split_once('_')?;
    Some((user_id.parse().ok()?, message_id.parse().ok()?))
}

/// Process-scoped relay state: messenger, directory, pending-reply slots
/// and the static administrator set, all injected rather than ambient.
pub struct Relay<M> {
    messenger: M,
    directory: Directory,
    pending: PendingReplies,
    admins: HashSet<i64>,
}

impl<M: Messenger> Relay<M> {
    pub fn new(messenger: M, directory: Directory, admins: HashSet<i64>) -> Self {
        Self {
            messenger,
            directory,
            pending: PendingReplies::new(),
            admins,
        }
    }

    pub fn is_admin(&self, id: i64) -> bool {
        self.admins.contains(&id)
    }

    fn require_admin(&self, id: i64) -> Result<(), RelayError> {
        if self.is_admin(id) {
            Ok(())
        } else {
            Err(RelayError::Unauthorized)
        }
    }

    /// `/start`
    pub async fn on_start(&self, sender: &Sender) -> Result<(), RelayError> {
        self.messenger
            .send_text(
                sender.id,
                "👋 Hi! Write your message and I'll forward it to the administrators 📩",
            )
            .await?;
        Ok(())
    }

    /// `/myid`
    pub async fn on_myid(&self, sender: &Sender) -> Result<(), RelayError> {
        self.messenger
            .send_text(sender.id, &format!("Your Telegram ID: {}", sender.id))
            .await?;
        Ok(())
    }

    /// `/help`
    pub async fn on_help(&self, sender: &Sender) -> Result<(), RelayError> {
        let text = "📖 Commands:\n\
            /start – Start the bot\n\
            /myid – Show your Telegram ID\n\
            /users – List recent users (admin only)\n\
            /reply <user_id> – Reply to a user directly\n\
            /broadcast <text> – Message every known user (media via reply)\n\
            /send <user_id or name> <text> – Send a message as the bot";
        self.messenger.send_text(sender.id, text).await?;
        Ok(())
    }

    /// `/users` — recent distinct users, admin only.
    pub async fn on_users(&self, sender: &Sender) -> Result<(), RelayError> {
        self.require_admin(sender.id)?;

        let users = self.directory.list_recent_users(RECENT_USERS_LIMIT).await?;
        if users.is_empty() {
            self.messenger
                .send_text(sender.id, "👤 No users yet.")
                .await?;
            return Ok(());
        }

        let mut text = String::from("👥 Recent users:\n");
        for user in users {
            text.push_str(&format!(
                "🆔 {} | @{}\n",
                user.user_id,
                user.display_name.as_deref().unwrap_or("no name")
            ));
        }
        self.messenger.send_text(sender.id, &text).await?;
        Ok(())
    }

    /// `/reply <user_id>` — arm the pending-reply slot without a message id.
    pub async fn on_reply_command(&self, sender: &Sender, arg: &str) -> Result<(), RelayError> {
        self.require_admin(sender.id)?;

        let user_id: i64 = arg
            .trim()
            .parse()
            .map_err(|_| RelayError::InvalidArgument("Usage: /reply <user_id>".to_string()))?;

        self.pending
            .begin(
                sender.id,
                ReplyTarget {
                    user_id,
                    message_id: None,
                },
            )
            .await;

        self.messenger
            .send_text(
                sender.id,
                &format!("✏️ Now type your reply to user {user_id}."),
            )
            .await?;
        Ok(())
    }

    /// `/broadcast <text>` — fan out to every known user. A replied-to
    /// message takes precedence over trailing text as the payload.
    pub async fn on_broadcast(
        &self,
        sender: &Sender,
        text: &str,
        reply: Option<Payload>,
    ) -> Result<(), RelayError> {
        self.require_admin(sender.id)?;

        let text = text.trim();
        let payload = match reply {
            Some(payload) => payload,
            None if !text.is_empty() => Payload::Text {
                text: format!("📢 Broadcast:\n{text}"),
            },
            None => return Err(RelayError::EmptyBroadcast),
        };

        let recipients = self.directory.list_all_user_ids().await?;
        let report = send_many(&self.messenger, &recipients, &payload).await;
        tracing::info!(sent = report.sent, failed = report.failed, "broadcast finished");

        self.messenger
            .send_text(
                sender.id,
                &format!(
                    "✅ Broadcast finished.\nSent: {} | Failed: {}",
                    report.sent, report.failed
                ),
            )
            .await?;
        Ok(())
    }

    /// `/send <user_id or name> <text>` — one-off delivery to an explicit
    /// target; name forms are resolved through the directory.
    pub async fn on_send(
        &self,
        sender: &Sender,
        args: &str,
        reply: Option<Payload>,
    ) -> Result<(), RelayError> {
        self.require_admin(sender.id)?;

        let args = args.trim();
        if args.is_empty() {
            return Err(RelayError::MissingTarget);
        }
        let (target_raw, text) = match args.split_once(char::is_whitespace) {
            Some((target, rest)) => (target, rest.trim()),
            None => (args, ""),
        };

        let target_id = match target_raw.parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                let name = target_raw.trim_start_matches('@');
                self.directory
                    .find_user_id_by_display_name(name)
                    .await?
                    .ok_or_else(|| RelayError::TargetResolution(name.to_string()))?
            }
        };

        let payload = match reply {
            Some(payload) => payload.with_caption_override(Some(text.to_owned())),
            None if !text.is_empty() => Payload::Text {
                text: text.to_owned(),
            },
            None => return Err(RelayError::EmptyMessage),
        };

        self.messenger.send(target_id, &payload, None).await?;
        self.messenger
            .send_text(sender.id, &format!("✅ Message sent to {target_raw}"))
            .await?;
        Ok(())
    }

    /// Free (non-command) inbound content: an administrator's pending reply
    /// or an ordinary user's message to be relayed.
    pub async fn on_message(
        &self,
        sender: &Sender,
        message_id: i32,
        payload: Option<Payload>,
    ) -> Result<(), RelayError> {
        if self.is_admin(sender.id) {
            self.deliver_pending_reply(sender, payload).await
        } else {
            self.relay_user_message(sender, message_id, payload).await
        }
    }

    async fn deliver_pending_reply(
        &self,
        sender: &Sender,
        payload: Option<Payload>,
    ) -> Result<(), RelayError> {
        // Unsupported content leaves the slot armed so the admin can retry
        let Some(payload) = payload else {
            self.messenger
                .send_text(sender.id, "❌ This message type can't be forwarded.")
                .await?;
            return Ok(());
        };

        let Some(target) = self.pending.take(sender.id).await else {
            self.messenger
                .send_text(
                    sender.id,
                    "ℹ️ Press the Reply button under a message or use /reply <user_id> first.",
                )
                .await?;
            return Ok(());
        };

        self.messenger
            .send(target.user_id, &payload, target.message_id)
            .await?;
        self.messenger
            .send_text(sender.id, "✅ Reply delivered to the user.")
            .await?;
        Ok(())
    }

    async fn relay_user_message(
        &self,
        sender: &Sender,
        message_id: i32,
        payload: Option<Payload>,
    ) -> Result<(), RelayError> {
        let summary = payload
            .as_ref()
            .map_or_else(|| UNKNOWN_CONTENT.to_string(), Payload::summary);

        // Storage failure must not stop forwarding
        if let Err(err) = self
            .directory
            .record(sender.id, sender.display_name.as_deref(), message_id, &summary)
            .await
        {
            tracing::warn!(user_id = sender.id, error = %err, "failed to record user message");
        }

        let notification = format!(
            "📢 New message\n👤 From: @{}\n🆔 ID: {}\n💬 {}",
            sender.display(),
            sender.id,
            summary
        );
        for &admin_id in &self.admins {
            if let Err(err) = self
                .messenger
                .send_with_reply_button(admin_id, &notification, sender.id, message_id)
                .await
            {
                tracing::warn!(admin_id, error = %err, "failed to notify administrator");
            }
        }

        self.messenger
            .send_text(
                sender.id,
                "✅ Your message was forwarded to the administrators!",
            )
            .await?;
        Ok(())
    }

    /// A press on the inline reply button. The admin check runs even though
    /// the button is only shown to admins; callback payloads can be forged.
    pub async fn on_callback(&self, clicker: &Sender, data: &str) -> Result<(), RelayError> {
        let Some((user_id, message_id)) = parse_reply_callback(data) else {
            tracing::warn!(data, "ignoring malformed callback payload");
            return Ok(());
        };

        if !self.is_admin(clicker.id) {
            self.messenger
                .send_text(clicker.id, "❌ This button is for administrators only.")
                .await?;
            return Ok(());
        }

        self.pending
            .begin(
                clicker.id,
                ReplyTarget {
                    user_id,
                    message_id: Some(message_id),
                },
            )
            .await;

        self.messenger
            .send_text(clicker.id, "✏️ Type your reply:")
            .await?;
        Ok(())
    }

    /// Convert a routing error into a user-facing message, or a silent
    /// no-op for unauthorized access.
    pub async fn report_error(&self, recipient: i64, err: &RelayError) {
        let Some(text) = err.user_message() else {
            tracing::debug!(recipient, "ignoring unauthorized invocation");
            return;
        };
        if let Err(send_err) = self.messenger.send_text(recipient, &format!("❌ {text}")).await {
            tracing::warn!(recipient, error = %send_err, "failed to report error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Outgoing {
        Message {
            recipient: i64,
            payload: Payload,
            reply_to: Option<i32>,
        },
        ButtonMessage {
            recipient: i64,
            text: String,
            target: (i64, i32),
        },
    }

    #[derive(Default)]
    struct RecordingMessenger {
        fail_for: HashSet<i64>,
        outgoing: Mutex<Vec<Outgoing>>,
    }

    impl RecordingMessenger {
        fn failing_for(fail_for: impl IntoIterator<Item = i64>) -> Self {
            Self {
                fail_for: fail_for.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send(
            &self,
            recipient: i64,
            payload: &Payload,
            reply_to: Option<i32>,
        ) -> Result<(), DeliveryError> {
            if self.fail_for.contains(&recipient) {
                return Err(DeliveryError("Forbidden: bot was blocked".to_string()));
            }
            self.outgoing.lock().await.push(Outgoing::Message {
                recipient,
                payload: payload.clone(),
                reply_to,
            });
            Ok(())
        }

        async fn send_with_reply_button(
            &self,
            recipient: i64,
            text: &str,
            target_user: i64,
            target_message: i32,
        ) -> Result<(), DeliveryError> {
            if self.fail_for.contains(&recipient) {
                return Err(DeliveryError("Forbidden: bot was blocked".to_string()));
            }
            self.outgoing.lock().await.push(Outgoing::ButtonMessage {
                recipient,
                text: text.to_string(),
                target: (target_user, target_message),
            });
            Ok(())
        }
    }

    async fn in_memory_directory() -> Directory {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let directory = Directory::new(pool);
        directory.init_schema().await.unwrap();
        directory
    }

    async fn relay_with_admins(
        admins: impl IntoIterator<Item = i64>,
    ) -> Relay<RecordingMessenger> {
        Relay::new(
            RecordingMessenger::default(),
            in_memory_directory().await,
            admins.into_iter().collect(),
        )
    }

    fn alice() -> Sender {
        Sender {
            id: 111,
            display_name: Some("alice".to_string()),
        }
    }

    fn admin(id: i64) -> Sender {
        Sender {
            id,
            display_name: Some("admin".to_string()),
        }
    }

    fn text(body: &str) -> Payload {
        Payload::Text {
            text: body.to_string(),
        }
    }

    async fn sent(relay: &Relay<RecordingMessenger>) -> Vec<Outgoing> {
        relay.messenger.outgoing.lock().await.clone()
    }

    // ------------------------------------------------------------------
    // Callback parsing
    // ------------------------------------------------------------------

    #[test]
    fn test_parse_reply_callback() {
        assert_eq!(parse_reply_callback("reply_111_42"), Some((111, 42)));
        assert_eq!(parse_reply_callback("reply_-5_1"), Some((-5, 1)));
    }

    #[test]
    fn test_parse_reply_callback_malformed() {
        assert_eq!(parse_reply_callback("reply_111"), None);
        assert_eq!(parse_reply_callback("reply_a_b"), None);
        assert_eq!(parse_reply_callback("reply_1_2_3"), None);
        assert_eq!(parse_reply_callback("approve_1_2"), None);
        assert_eq!(parse_reply_callback(""), None);
    }

    // ------------------------------------------------------------------
    // Ordinary user messages
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_user_message_is_recorded_and_forwarded() {
        let relay = relay_with_admins([9, 10]).await;

        relay
            .on_message(&alice(), 42, Some(text("hello")))
            .await
            .unwrap();

        // Directory gained the row
        assert_eq!(relay.directory.list_all_user_ids().await.unwrap(), vec![111]);
        let recent = relay.directory.list_recent_users(10).await.unwrap();
        assert_eq!(recent[0].display_name.as_deref(), Some("alice"));

        let outgoing = sent(&relay).await;
        let notifications: Vec<_> = outgoing
            .iter()
            .filter_map(|o| match o {
                Outgoing::ButtonMessage {
                    recipient,
                    text,
                    target,
                } => Some((*recipient, text.clone(), *target)),
                Outgoing::Message { .. } => None,
            })
            .collect();

        // Every admin got a notification with the reply affordance
        assert_eq!(notifications.len(), 2);
        let mut notified: Vec<i64> = notifications.iter().map(|(r, _, _)| *r).collect();
        notified.sort_unstable();
        assert_eq!(notified, vec![9, 10]);
        for (_, text, target) in &notifications {
            assert!(text.contains("alice"));
            assert!(text.contains("111"));
            assert!(text.contains("hello"));
            assert_eq!(*target, (111, 42));
        }

        // The sender got an acknowledgement
        assert!(outgoing.iter().any(|o| matches!(
            o,
            Outgoing::Message { recipient: 111, .. }
        )));
    }

    #[tokio::test]
    async fn test_user_media_message_is_recorded_as_placeholder() {
        let relay = relay_with_admins([9]).await;

        let photo = Payload::Photo {
            file_id: "f1".to_string(),
            caption: None,
        };
        relay.on_message(&alice(), 7, Some(photo)).await.unwrap();

        let recent = relay.directory.list_recent_users(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        let outgoing = sent(&relay).await;
        assert!(outgoing.iter().any(|o| matches!(
            o,
            Outgoing::ButtonMessage { text, .. } if text.contains("photo sent")
        )));
    }

    #[tokio::test]
    async fn test_unclassifiable_user_message_uses_fallback() {
        let relay = relay_with_admins([9]).await;

        relay.on_message(&alice(), 7, None).await.unwrap();

        let outgoing = sent(&relay).await;
        assert!(outgoing.iter().any(|o| matches!(
            o,
            Outgoing::ButtonMessage { text, .. } if text.contains(UNKNOWN_CONTENT)
        )));
    }

    #[tokio::test]
    async fn test_one_failing_admin_does_not_block_the_rest() {
        let relay = Relay::new(
            RecordingMessenger::failing_for([9]),
            in_memory_directory().await,
            HashSet::from([9, 10]),
        );

        relay
            .on_message(&alice(), 42, Some(text("hello")))
            .await
            .unwrap();

        let outgoing = sent(&relay).await;
        assert!(outgoing.iter().any(|o| matches!(
            o,
            Outgoing::ButtonMessage { recipient: 10, .. }
        )));
    }

    // ------------------------------------------------------------------
    // Reply flow
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_callback_then_admin_reply_round_trip() {
        let relay = relay_with_admins([9]).await;

        relay.on_callback(&admin(9), "reply_111_42").await.unwrap();
        relay
            .on_message(&admin(9), 100, Some(text("hi back")))
            .await
            .unwrap();

        let outgoing = sent(&relay).await;
        assert!(outgoing.contains(&Outgoing::Message {
            recipient: 111,
            payload: text("hi back"),
            reply_to: Some(42),
        }));
        // Confirmation went back to the admin
        assert!(outgoing.iter().any(|o| matches!(
            o,
            Outgoing::Message { recipient: 9, .. }
        )));
        // The slot was consumed
        assert!(relay.pending.take(9).await.is_none());
    }

    #[tokio::test]
    async fn test_callback_from_non_admin_is_rejected() {
        let relay = relay_with_admins([9]).await;

        relay.on_callback(&alice(), "reply_222_1").await.unwrap();

        assert!(relay.pending.take(111).await.is_none());
        let outgoing = sent(&relay).await;
        assert!(outgoing.iter().any(|o| matches!(
            o,
            Outgoing::Message { recipient: 111, payload: Payload::Text { text }, .. }
                if text.contains("administrators only")
        )));
    }

    #[tokio::test]
    async fn test_malformed_callback_is_a_no_op() {
        let relay = relay_with_admins([9]).await;

        relay.on_callback(&admin(9), "reply_garbage").await.unwrap();

        assert!(sent(&relay).await.is_empty());
        assert!(relay.pending.take(9).await.is_none());
    }

    #[tokio::test]
    async fn test_admin_message_without_pending_gets_guidance() {
        let relay = relay_with_admins([9]).await;

        relay
            .on_message(&admin(9), 100, Some(text("stray text")))
            .await
            .unwrap();

        let outgoing = sent(&relay).await;
        assert_eq!(outgoing.len(), 1);
        assert!(matches!(
            &outgoing[0],
            Outgoing::Message { recipient: 9, payload: Payload::Text { text }, .. }
                if text.contains("/reply")
        ));
    }

    #[tokio::test]
    async fn test_reply_command_arms_slot_without_message_id() {
        let relay = relay_with_admins([9]).await;

        relay.on_reply_command(&admin(9), "111").await.unwrap();

        assert_eq!(
            relay.pending.take(9).await,
            Some(ReplyTarget {
                user_id: 111,
                message_id: None,
            })
        );
    }

    #[tokio::test]
    async fn test_reply_command_rejects_bad_argument() {
        let relay = relay_with_admins([9]).await;

        let err = relay.on_reply_command(&admin(9), "abc").await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidArgument(_)));

        let err = relay.on_reply_command(&admin(9), "").await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_reply_command_requires_admin() {
        let relay = relay_with_admins([9]).await;

        let err = relay.on_reply_command(&alice(), "222").await.unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
        assert!(sent(&relay).await.is_empty());
    }

    // ------------------------------------------------------------------
    // Broadcast
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_broadcast_reaches_every_known_user() {
        let relay = relay_with_admins([9]).await;
        relay.directory.record(111, None, 1, "a").await.unwrap();
        relay.directory.record(222, None, 2, "b").await.unwrap();

        relay.on_broadcast(&admin(9), "big news", None).await.unwrap();

        let outgoing = sent(&relay).await;
        for user in [111, 222] {
            assert!(outgoing.iter().any(|o| matches!(
                o,
                Outgoing::Message { recipient, payload: Payload::Text { text }, .. }
                    if *recipient == user && text.contains("big news")
            )));
        }
        // Tally reported back to the admin
        assert!(outgoing.iter().any(|o| matches!(
            o,
            Outgoing::Message { recipient: 9, payload: Payload::Text { text }, .. }
                if text.contains("Sent: 2") && text.contains("Failed: 0")
        )));
    }

    #[tokio::test]
    async fn test_broadcast_tallies_failures() {
        let relay = Relay::new(
            RecordingMessenger::failing_for([222]),
            in_memory_directory().await,
            HashSet::from([9]),
        );
        relay.directory.record(111, None, 1, "a").await.unwrap();
        relay.directory.record(222, None, 2, "b").await.unwrap();
        relay.directory.record(333, None, 3, "c").await.unwrap();

        relay.on_broadcast(&admin(9), "news", None).await.unwrap();

        let outgoing = sent(&relay).await;
        assert!(outgoing.iter().any(|o| matches!(
            o,
            Outgoing::Message { recipient: 9, payload: Payload::Text { text }, .. }
                if text.contains("Sent: 2") && text.contains("Failed: 1")
        )));
    }

    #[tokio::test]
    async fn test_broadcast_media_from_reply() {
        let relay = relay_with_admins([9]).await;
        relay.directory.record(111, None, 1, "a").await.unwrap();

        let photo = Payload::Photo {
            file_id: "f1".to_string(),
            caption: Some("look".to_string()),
        };
        relay
            .on_broadcast(&admin(9), "", Some(photo.clone()))
            .await
            .unwrap();

        let outgoing = sent(&relay).await;
        assert!(outgoing.contains(&Outgoing::Message {
            recipient: 111,
            payload: photo,
            reply_to: None,
        }));
    }

    #[tokio::test]
    async fn test_empty_broadcast_is_rejected_before_dispatch() {
        let relay = relay_with_admins([9]).await;
        relay.directory.record(111, None, 1, "a").await.unwrap();

        let err = relay.on_broadcast(&admin(9), "  ", None).await.unwrap_err();
        assert!(matches!(err, RelayError::EmptyBroadcast));
        assert!(sent(&relay).await.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_requires_admin() {
        let relay = relay_with_admins([9]).await;

        let err = relay.on_broadcast(&alice(), "hi", None).await.unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
    }

    // ------------------------------------------------------------------
    // Direct send
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_send_to_numeric_target() {
        let relay = relay_with_admins([9]).await;

        relay.on_send(&admin(9), "555 hello there", None).await.unwrap();

        let outgoing = sent(&relay).await;
        assert!(outgoing.contains(&Outgoing::Message {
            recipient: 555,
            payload: text("hello there"),
            reply_to: None,
        }));
    }

    #[tokio::test]
    async fn test_send_resolves_display_name() {
        let relay = relay_with_admins([9]).await;
        relay.directory.record(111, Some("alice"), 1, "a").await.unwrap();

        relay.on_send(&admin(9), "@alice hello", None).await.unwrap();

        let outgoing = sent(&relay).await;
        assert!(outgoing.contains(&Outgoing::Message {
            recipient: 111,
            payload: text("hello"),
            reply_to: None,
        }));
    }

    #[tokio::test]
    async fn test_send_unknown_name_fails() {
        let relay = relay_with_admins([9]).await;

        let err = relay.on_send(&admin(9), "@nobody hi", None).await.unwrap_err();
        assert!(matches!(err, RelayError::TargetResolution(name) if name == "nobody"));
    }

    #[tokio::test]
    async fn test_send_media_with_caption_override() {
        let relay = relay_with_admins([9]).await;

        let photo = Payload::Photo {
            file_id: "f1".to_string(),
            caption: Some("old".to_string()),
        };
        relay
            .on_send(&admin(9), "555 fresh caption", Some(photo))
            .await
            .unwrap();

        let outgoing = sent(&relay).await;
        assert!(outgoing.contains(&Outgoing::Message {
            recipient: 555,
            payload: Payload::Photo {
                file_id: "f1".to_string(),
                caption: Some("fresh caption".to_string()),
            },
            reply_to: None,
        }));
    }

    #[tokio::test]
    async fn test_send_without_target_or_content() {
        let relay = relay_with_admins([9]).await;

        let err = relay.on_send(&admin(9), "", None).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingTarget));

        let err = relay.on_send(&admin(9), "555", None).await.unwrap_err();
        assert!(matches!(err, RelayError::EmptyMessage));
    }

    #[tokio::test]
    async fn test_send_delivery_failure_is_reported() {
        let relay = Relay::new(
            RecordingMessenger::failing_for([555]),
            in_memory_directory().await,
            HashSet::from([9]),
        );

        let err = relay.on_send(&admin(9), "555 hi", None).await.unwrap_err();
        // Transport error text survives verbatim for the admin
        assert!(err.user_message().unwrap().contains("Forbidden: bot was blocked"));
    }

    // ------------------------------------------------------------------
    // /users and error reporting
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_users_listing() {
        let relay = relay_with_admins([9]).await;
        relay.directory.record(111, Some("alice"), 1, "a").await.unwrap();
        relay.directory.record(222, Some("bob"), 2, "b").await.unwrap();

        relay.on_users(&admin(9)).await.unwrap();

        let outgoing = sent(&relay).await;
        assert!(matches!(
            &outgoing[0],
            Outgoing::Message { recipient: 9, payload: Payload::Text { text }, .. }
                if text.contains("111") && text.contains("alice")
                    && text.contains("222") && text.contains("bob")
        ));
    }

    #[tokio::test]
    async fn test_users_empty_directory() {
        let relay = relay_with_admins([9]).await;

        relay.on_users(&admin(9)).await.unwrap();

        let outgoing = sent(&relay).await;
        assert!(matches!(
            &outgoing[0],
            Outgoing::Message { payload: Payload::Text { text }, .. }
                if text.contains("No users yet")
        ));
    }

    #[tokio::test]
    async fn test_users_from_non_admin_is_silent() {
        let relay = relay_with_admins([9]).await;

        let err = relay.on_users(&alice()).await.unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));

        // No response at all, the command stays undiscoverable
        relay.report_error(111, &err).await;
        assert!(sent(&relay).await.is_empty());
    }

    #[tokio::test]
    async fn test_report_error_sends_guidance() {
        let relay = relay_with_admins([9]).await;

        relay.report_error(9, &RelayError::EmptyBroadcast).await;

        let outgoing = sent(&relay).await;
        assert!(matches!(
            &outgoing[0],
            Outgoing::Message { recipient: 9, payload: Payload::Text { text }, .. }
                if text.contains("Broadcast needs text")
        ));
    }
}
