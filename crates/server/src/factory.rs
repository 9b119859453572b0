//! Construction of the long-lived components from configuration.

use std::sync::Arc;

use spyglass_audit::{AuditStore, AuditTrail};
use spyglass_audit_file::FileAuditStore;
use spyglass_audit_memory::MemoryAuditStore;
use spyglass_bot::{Bot, BotSettings};
use spyglass_policy::{AuthorizationPolicy, EnvFile};
use spyglass_search::{SearchBackend, SearchClient, SearchConfig};
use spyglass_slack::{SlackClient, SlackConfig};
use tracing::{info, warn};

use crate::api::AppState;
use crate::config::{AuditSection, SpyglassConfig};
use crate::error::ServerError;

/// Tokens read from the environment.
#[derive(Clone, Default)]
pub struct Secrets {
    pub search_token: Option<String>,
    pub slack_token: Option<String>,
}

impl Secrets {
    /// `SEARCH_TOKEN` and `SLACK_BOT_TOKEN`; blank values count as unset.
    pub fn from_env() -> Self {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        Self {
            search_token: read("SEARCH_TOKEN"),
            slack_token: read("SLACK_BOT_TOKEN"),
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("search_token", &self.search_token.as_ref().map(|_| "[REDACTED]"))
            .field("slack_token", &self.slack_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Create an audit store from the given configuration.
pub fn create_audit_store(config: &AuditSection) -> Result<Arc<dyn AuditStore>, ServerError> {
    let store: Arc<dyn AuditStore> = match config.backend.as_str() {
        "file" => Arc::new(FileAuditStore::new(&config.path)),
        "memory" => {
            warn!("audit backend is in-memory; entries will not survive a restart");
            Arc::new(MemoryAuditStore::new())
        }
        other => {
            return Err(ServerError::Config(format!(
                "unknown audit backend: {other} (expected \"file\" or \"memory\")"
            )));
        }
    };
    Ok(store)
}

/// Build the command dispatcher over an explicit backend.
pub async fn build_bot(
    config: &SpyglassConfig,
    secrets: &Secrets,
    backend: Arc<dyn SearchBackend>,
) -> Result<Bot, ServerError> {
    let policy = AuthorizationPolicy::load(EnvFile::new(&config.bot.env_file))?
        .with_channel_enforcement(config.bot.enforce_channel_allowlist);
    let snapshot = policy.snapshot();
    info!(
        env_file = %config.bot.env_file.display(),
        admins = snapshot.admins.len(),
        channels = snapshot.channels.len(),
        "authorization policy loaded"
    );
    if snapshot.admins.is_empty() {
        warn!("no admins configured; the first `!admin-add` will bootstrap the roster");
    }

    let store = create_audit_store(&config.audit)?;
    let audit = AuditTrail::open(store).await?;

    let settings = BotSettings {
        default_result_limit: config.bot.result_limit,
        wait: config.search.wait_policy(),
        export_dir: config.audit.export_dir.clone(),
        search_base_url: config.search.base_url.clone(),
        verify_tls: config.search.verify_tls,
        search_token: secrets.search_token.clone(),
        chat_token: secrets.slack_token.clone(),
        transport: if secrets.slack_token.is_some() {
            "Slack Events API".to_owned()
        } else {
            "HTTP".to_owned()
        },
    };

    Ok(Bot::new(backend, Arc::new(policy), Arc::new(audit), settings))
}

/// Build the search client, dispatcher and optional Slack client.
pub async fn build_state(
    config: &SpyglassConfig,
    secrets: &Secrets,
) -> Result<AppState, ServerError> {
    let token = secrets.search_token.clone().unwrap_or_else(|| {
        warn!("SEARCH_TOKEN is not set; backend requests will be unauthenticated");
        String::new()
    });
    if !config.search.verify_tls {
        warn!("TLS certificate verification is disabled for the search backend");
    }
    let search_config = SearchConfig::new(&config.search.base_url, token)
        .with_verify_tls(config.search.verify_tls)
        .with_timeout(config.search.timeout());
    let backend: Arc<dyn SearchBackend> = Arc::new(SearchClient::new(search_config)?);

    let bot = build_bot(config, secrets, backend).await?;

    let slack = match &secrets.slack_token {
        Some(token) => {
            let slack_config =
                SlackConfig::new(token.as_str()).with_api_base_url(&config.slack.api_base_url);
            Some(Arc::new(SlackClient::new(slack_config)?))
        }
        None => {
            info!("SLACK_BOT_TOKEN is not set; /slack/events is disabled");
            None
        }
    };

    Ok(AppState {
        bot: Arc::new(bot),
        slack,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_audit_backend_is_rejected() {
        let section = AuditSection {
            backend: "postgres".into(),
            ..AuditSection::default()
        };
        let err = create_audit_store(&section).err().unwrap();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn secrets_debug_is_redacted() {
        let secrets = Secrets {
            search_token: Some("abc-secret".into()),
            slack_token: None,
        };
        let debug = format!("{secrets:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("abc-secret"));
    }
}
