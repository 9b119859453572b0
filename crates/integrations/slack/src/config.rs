use std::time::Duration;

/// Default Slack Web API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Configuration for talking to the Slack Web API.
#[derive(Clone)]
pub struct SlackConfig {
    /// Bot OAuth token (`xoxb-...`).
    pub token: String,

    /// Base URL for the Web API. Override this for testing against a mock
    /// server.
    pub api_base_url: String,

    pub timeout: Duration,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SlackConfig {
    /// Create a configuration for `token` against the public API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
