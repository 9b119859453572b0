use thiserror::Error;

/// Errors returned by the search backend client.
///
/// None of these are retried by the client. Callers report them once and
/// move on.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A network or transport-level failure (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a status code of 400 or above.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, surfaced verbatim.
        body: String,
    },

    /// Job creation was rejected or the response carried no job id.
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// The named resource does not exist on the backend.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The client was given an unusable configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
