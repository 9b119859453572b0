use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::BotError;

/// Sends text back to the channel a command came from.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), BotError>;
}

/// Keeps every reply in memory.
#[derive(Debug, Default)]
pub struct CollectingResponder {
    replies: Mutex<Vec<String>>,
}

impl CollectingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }

    pub fn into_replies(self) -> Vec<String> {
        self.replies.into_inner()
    }
}

#[async_trait]
impl Responder for CollectingResponder {
    async fn send(&self, text: &str) -> Result<(), BotError> {
        self.replies.lock().push(text.to_owned());
        Ok(())
    }
}
