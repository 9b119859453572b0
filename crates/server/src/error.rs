use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use spyglass_audit::AuditError;
use spyglass_policy::PolicyError;
use spyglass_search::SearchError;
use spyglass_slack::SlackError;
use thiserror::Error;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Slack(#[from] SlackError),

    /// The inbound request could not be used.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Search(_) | Self::Slack(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) | Self::Policy(_) | Self::Audit(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
