use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::SlackConfig;
use crate::error::SlackError;
use crate::types::{ApiResponse, PostMessageRequest};

/// Minimal Slack Web API client: posting messages is all the bot needs.
pub struct SlackClient {
    config: SlackConfig,
    client: Client,
}

impl SlackClient {
    pub fn new(config: SlackConfig) -> Result<Self, SlackError> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(config: SlackConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.config.api_base_url)
    }

    /// Call `chat.postMessage` and interpret the response.
    #[instrument(skip(self, request), fields(channel = %request.channel))]
    pub async fn post_message(&self, request: &PostMessageRequest) -> Result<ApiResponse, SlackError> {
        debug!(chars = request.text.chars().count(), "posting message to Slack");

        let response = self
            .client
            .post(self.api_url("chat.postMessage"))
            .bearer_auth(&self.config.token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Slack API rate limit hit");
            return Err(SlackError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("HTTP {status}: {body}")));
        }

        let api_response: ApiResponse = response.json().await?;
        if !api_response.ok {
            let code = api_response
                .error
                .unwrap_or_else(|| "unknown_error".to_owned());
            return Err(SlackError::Api(code));
        }
        Ok(api_response)
    }
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
