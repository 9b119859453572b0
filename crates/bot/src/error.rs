use spyglass_audit::AuditError;
use spyglass_policy::PolicyError;
use spyglass_search::SearchError;
use thiserror::Error;

/// Malformed command arguments. The message is the user-facing reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced while handling a command.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller failed an authorization check.
    #[error("access denied: {0}")]
    Denied(String),

    /// The reply could not be delivered.
    #[error("reply failed: {0}")]
    Reply(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_lower_layers_transparently() {
        let err: BotError = SearchError::NotFound("x".into()).into();
        assert_eq!(err.to_string(), "not found: x");
    }

    #[test]
    fn validation_message_is_the_reply() {
        assert_eq!(ValidationError::new("❌ bad").to_string(), "❌ bad");
    }
}
