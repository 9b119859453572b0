use serde::{Deserialize, Serialize};
use spyglass_audit::Actor;

/// A chat message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: Option<String>,
    pub text: String,
}

impl IncomingMessage {
    pub fn new(
        user_id: impl Into<String>,
        channel_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: None,
            channel_id: channel_id.into(),
            channel_name: None,
            text: text.into(),
        }
    }

    /// Who sent this, for the audit trail. Unknown names fall back to
    /// `unknown`.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone().unwrap_or_else(|| "unknown".into()),
            channel_id: self.channel_id.clone(),
            channel_name: self.channel_name.clone().unwrap_or_else(|| "unknown".into()),
        }
    }
}
