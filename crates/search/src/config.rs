use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Connection settings for the search backend.
#[derive(Clone)]
pub struct SearchConfig {
    /// Base URL of the management API, e.g. `https://search.example.com:8089`.
    pub base_url: String,

    /// Static token sent in the `Authorization` header of every request.
    pub token: String,

    /// Verify the server's TLS certificate. Turning this off is meant for lab
    /// installs with self-signed certificates.
    pub verify_tls: bool,

    /// Timeout applied to every individual HTTP request.
    pub timeout: Duration,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SearchConfig {
    /// Create a configuration with certificate verification on and the
    /// default timeout.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value of the `Authorization` header.
    ///
    /// A token that already names its scheme (`Splunk abc`, `Bearer abc`) is
    /// sent as is; a bare token is sent as a bearer token.
    pub fn authorization(&self) -> String {
        let token = self.token.trim();
        if token.contains(char::is_whitespace) {
            token.to_owned()
        } else {
            format!("Bearer {token}")
        }
    }
}
