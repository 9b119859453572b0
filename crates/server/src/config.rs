use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use spyglass_search::WaitPolicy;

/// Top-level configuration for the spyglass process, loaded from a TOML file.
///
/// Tokens never live here; they are read from the environment.
#[derive(Debug, Default, Deserialize)]
pub struct SpyglassConfig {
    /// Search backend connection.
    #[serde(default)]
    pub search: SearchSection,
    /// Command dispatch settings.
    #[serde(default)]
    pub bot: BotSection,
    /// Audit trail storage.
    #[serde(default)]
    pub audit: AuditSection,
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub slack: SlackSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl SpyglassConfig {
    /// Parse a TOML document. An empty document yields all defaults.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchSection {
    /// Management API root, e.g. `https://search.example.com:8089`.
    #[serde(default = "default_search_url")]
    pub base_url: String,
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// How long a command waits for a job before reporting a timeout.
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl SearchSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_secs(self.max_wait_seconds),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            base_url: default_search_url(),
            verify_tls: true,
            timeout_seconds: default_timeout_seconds(),
            max_wait_seconds: default_max_wait_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_search_url() -> String {
    "https://localhost:8089".to_owned()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    20
}

fn default_max_wait_seconds() -> u64 {
    35
}

fn default_poll_interval_ms() -> u64 {
    1500
}

#[derive(Debug, Deserialize)]
pub struct BotSection {
    /// Rows shown per result digest unless overridden at runtime.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
    /// Key=value file holding the admin roster, channel allowlist and flags.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
    /// Require a non-empty channel allowlist to contain the channel before
    /// raw queries run.
    #[serde(default)]
    pub enforce_channel_allowlist: bool,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            env_file: default_env_file(),
            enforce_channel_allowlist: false,
        }
    }
}

fn default_result_limit() -> usize {
    5
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

/// Configuration for the audit trail.
#[derive(Debug, Deserialize)]
pub struct AuditSection {
    /// `"file"` (durable, default) or `"memory"` (lost on restart).
    #[serde(default = "default_audit_backend")]
    pub backend: String,
    /// Append-only JSON-lines file used by the `file` backend.
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,
    /// Directory export files are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            backend: default_audit_backend(),
            path: default_audit_path(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_audit_backend() -> String {
    "file".to_owned()
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("bot_audit.log")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize)]
pub struct SlackSection {
    #[serde(default = "default_slack_api")]
    pub api_base_url: String,
}

impl Default for SlackSection {
    fn default() -> Self {
        Self {
            api_base_url: default_slack_api(),
        }
    }
}

fn default_slack_api() -> String {
    spyglass_slack::DEFAULT_API_BASE_URL.to_owned()
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingSection {
    /// Also write the operational log to this file.
    #[serde(default)]
    pub file: Option<PathBuf>,
}
