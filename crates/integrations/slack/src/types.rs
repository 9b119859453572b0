//! Wire types for the Web API and the Events API.

use serde::{Deserialize, Serialize};
use spyglass_bot::IncomingMessage;

/// Body of a `chat.postMessage` call.
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest {
    pub channel: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Always false; result digests are plain text.
    pub unfurl_links: bool,
}

/// Common envelope of Web API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

/// Outer payload delivered to the Events API endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Sent once when the endpoint is registered; must be echoed back.
    UrlVerification { challenge: String },
    EventCallback { event: MessageEvent },
    #[serde(other)]
    Unsupported,
}

/// The subset of an inner event the bot reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

impl MessageEvent {
    /// A plain user message as the bot sees it.
    ///
    /// Bot messages (including the bot's own replies), edits and other
    /// subtypes yield `None`.
    pub fn into_incoming(self) -> Option<IncomingMessage> {
        if self.kind != "message" || self.bot_id.is_some() || self.subtype.is_some() {
            return None;
        }
        let (Some(user), Some(channel), Some(text)) = (self.user, self.channel, self.text) else {
            return None;
        };
        Some(IncomingMessage::new(user, channel, text))
    }
}
