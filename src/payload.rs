//! Outbound payload classification.
//!
//! Inbound content is classified into a tagged variant exactly once, at
//! ingestion; the messenger consumes it uniformly afterwards. Media
//! variants carry the Telegram file id so they can be re-sent without
//! downloading the content.

use teloxide::types::Message;

/// A classified unit of content destined for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text {
        text: String,
    },
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Video {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_id: String,
        file_name: Option<String>,
        caption: Option<String>,
    },
    Audio {
        file_id: String,
        caption: Option<String>,
    },
    Voice {
        file_id: String,
        caption: Option<String>,
    },
}

/// Placeholder for content kinds the relay does not understand.
pub const UNKNOWN_CONTENT: &str = "unknown message type";

impl Payload {
    /// Classify a Telegram message. Returns `None` for content kinds the
    /// relay does not understand (stickers, polls, location, ...).
    pub fn from_message(msg: &Message) -> Option<Self> {
        let caption = msg.caption().map(str::to_owned);

        if let Some(text) = msg.text() {
            return Some(Payload::Text {
                text: text.to_owned(),
            });
        }
        if let Some(sizes) = msg.photo() {
            // Telegram lists photo sizes small to large; forward the largest
            let photo = sizes.last()?;
            return Some(Payload::Photo {
                file_id: photo.file.id.clone(),
                caption,
            });
        }
        if let Some(video) = msg.video() {
            return Some(Payload::Video {
                file_id: video.file.id.clone(),
                caption,
            });
        }
        if let Some(document) = msg.document() {
            return Some(Payload::Document {
                file_id: document.file.id.clone(),
                file_name: document.file_name.clone(),
                caption,
            });
        }
        if let Some(audio) = msg.audio() {
            return Some(Payload::Audio {
                file_id: audio.file.id.clone(),
                caption,
            });
        }
        if let Some(voice) = msg.voice() {
            return Some(Payload::Voice {
                file_id: voice.file.id.clone(),
                caption,
            });
        }
        None
    }

    /// Human-readable placeholder naming the content kind. Text passes
    /// through verbatim; this is what gets recorded in the directory and
    /// shown in admin notifications.
    pub fn summary(&self) -> String {
        match self {
            Payload::Text { text } => text.clone(),
            Payload::Photo { .. } => "photo sent".to_string(),
            Payload::Video { .. } => "video sent".to_string(),
            Payload::Document {
                file_name: Some(name),
                ..
            } => format!("document: {name}"),
            Payload::Document {
                file_name: None, ..
            } => "document sent".to_string(),
            Payload::Audio { .. } => "audio sent".to_string(),
            Payload::Voice { .. } => "voice message sent".to_string(),
        }
    }

    /// Replace the caption (or the text, for a text payload) when an
    /// administrator supplied trailing command text alongside a replied-to
    /// message. A `None` override leaves the payload untouched.
    pub fn with_caption_override(mut self, text: Option<String>) -> Self {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return self;
        };
        match &mut self {
            Payload::Text { text: body } => *body = text,
            Payload::Photo { caption, .. }
            | Payload::Video { caption, .. }
            | Payload::Document { caption, .. }
            | Payload::Audio { caption, .. }
            | Payload::Voice { caption, .. } => *caption = Some(text),
        }
        self
    }
}
