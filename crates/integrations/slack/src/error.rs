use spyglass_bot::BotError;
use thiserror::Error;

/// Errors from the Slack Web API.
#[derive(Debug, Error)]
pub enum SlackError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered `ok: false` or a non-success status.
    #[error("Slack API error: {0}")]
    Api(String),

    /// HTTP 429.
    #[error("rate limited by Slack")]
    RateLimited,
}

impl From<SlackError> for BotError {
    fn from(err: SlackError) -> Self {
        BotError::Reply(err.to_string())
    }
}
