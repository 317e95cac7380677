//! Outbound delivery abstraction.
//!
//! The router talks to a [`Messenger`] trait so the relay core can be
//! exercised without a live transport; [`telegram::TelegramMessenger`] is
//! the production implementation. Fan-out lives here as [`send_many`]:
//! best-effort, per-recipient failures tallied, never aborting the batch.

pub mod telegram;

use crate::error::DeliveryError;
use crate::payload::Payload;
use async_trait::async_trait;
use std::time::Duration;

/// Per-send timeout so one unreachable recipient cannot stall a batch.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a fan-out: how many deliveries succeeded and failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

/// One-way delivery of payloads to recipients.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver a payload to one recipient, optionally as a reply to one of
    /// the recipient's earlier messages.
    async fn send(
        &self,
        recipient: i64,
        payload: &Payload,
        reply_to: Option<i32>,
    ) -> Result<(), DeliveryError>;

    /// Deliver an admin notification carrying an inline "reply" button
    /// that encodes the originating user and message.
    async fn send_with_reply_button(
        &self,
        recipient: i64,
        text: &str,
        target_user: i64,
        target_message: i32,
    ) -> Result<(), DeliveryError>;

    /// Plain text shortcut.
    async fn send_text(&self, recipient: i64, text: &str) -> Result<(), DeliveryError> {
        self.send(
            recipient,
            &Payload::Text {
                text: text.to_owned(),
            },
            None,
        )
        .await
    }
}

/// Deliver `payload` to every recipient, counting successes and failures.
///
/// Every recipient is attempted regardless of earlier failures; a send that
/// errors or exceeds [`SEND_TIMEOUT`] only bumps the failure tally.
pub async fn send_many<M>(messenger: &M, recipients: &[i64], payload: &Payload) -> DeliveryReport
where
    M: Messenger + ?Sized,
{
    let mut report = DeliveryReport::default();

    for &recipient in recipients {
        match tokio::time::timeout(SEND_TIMEOUT, messenger.send(recipient, payload, None)).await {
            Ok(Ok(())) => report.sent += 1,
            Ok(Err(err)) => {
                tracing::warn!(recipient, error = %err, "delivery failed");
                report.failed += 1;
            }
            Err(_) => {
                tracing::warn!(recipient, "delivery timed out");
                report.failed += 1;
            }
        }
    }

    report
}
