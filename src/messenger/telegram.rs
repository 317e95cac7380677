//! Telegram messenger implementation.
//!
//! Maps payload variants onto the matching Bot API calls. All transport
//! errors are flattened into [`DeliveryError`] with their text preserved.

use super::Messenger;
use crate::error::DeliveryError;
use crate::payload::Payload;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ReplyParameters,
};

/// Callback-data prefix for the inline reply affordance. The router parses
/// the full form `reply_<user_id>_<message_id>` back out of callbacks.
pub const REPLY_CALLBACK_PREFIX: &str = "reply_";

/// Production messenger backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Inline keyboard with a single reply button for an admin notification.
fn reply_keyboard(target_user: i64, target_message: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        "✏️ Reply",
        format!("{REPLY_CALLBACK_PREFIX}{target_user}_{target_message}"),
    )]])
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(
        &self,
        recipient: i64,
        payload: &Payload,
        reply_to: Option<i32>,
    ) -> Result<(), DeliveryError> {
        let chat_id = ChatId(recipient);
        let reply_parameters = reply_to.map(|id| ReplyParameters::new(MessageId(id)));

        let result = match payload {
            Payload::Text { text } => {
                let mut request = self.bot.send_message(chat_id, text);
                if let Some(params) = reply_parameters {
                    request = request.reply_parameters(params);
                }
                request.await.map(|_| ())
            }
            Payload::Photo { file_id, caption } => {
                let mut request = self
                    .bot
                    .send_photo(chat_id, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                if let Some(params) = reply_parameters {
                    request = request.reply_parameters(params);
                }
                request.await.map(|_| ())
            }
            Payload::Video { file_id, caption } => {
                let mut request = self
                    .bot
                    .send_video(chat_id, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                if let Some(params) = reply_parameters {
                    request = request.reply_parameters(params);
                }
                request.await.map(|_| ())
            }
            Payload::Document {
                file_id, caption, ..
            } => {
                let mut request = self
                    .bot
                    .send_document(chat_id, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                if let Some(params) = reply_parameters {
                    request = request.reply_parameters(params);
                }
                request.await.map(|_| ())
            }
            Payload::Audio { file_id, caption } => {
                let mut request = self
                    .bot
                    .send_audio(chat_id, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                if let Some(params) = reply_parameters {
                    request = request.reply_parameters(params);
                }
                request.await.map(|_| ())
            }
            Payload::Voice { file_id, caption } => {
                let mut request = self
                    .bot
                    .send_voice(chat_id, InputFile::file_id(file_id.clone()));
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                if let Some(params) = reply_parameters {
                    request = request.reply_parameters(params);
                }
                request.await.map(|_| ())
            }
        };

        result.map_err(|err| DeliveryError(err.to_string()))
    }

    async fn send_with_reply_button(
        &self,
        recipient: i64,
        text: &str,
        target_user: i64,
        target_message: i32,
    ) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(recipient), text)
            .reply_markup(reply_keyboard(target_user, target_message))
            .await
            .map(|_| ())
            .map_err(|err| DeliveryError(err.to_string()))
    }
}
