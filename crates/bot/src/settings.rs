use std::path::PathBuf;

use spyglass_search::WaitPolicy;

/// Process-level settings the handlers read but never change.
#[derive(Clone)]
pub struct BotSettings {
    /// Rows fetched when neither the command nor the policy file names a limit.
    pub default_result_limit: usize,
    pub wait: WaitPolicy,
    /// Where `!export-logs` writes its files.
    pub export_dir: PathBuf,
    /// Shown by the status and configuration commands.
    pub search_base_url: String,
    pub verify_tls: bool,
    pub search_token: Option<String>,
    pub chat_token: Option<String>,
    /// How the bot receives messages, for `!system-status`.
    pub transport: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            default_result_limit: 5,
            wait: WaitPolicy::default(),
            export_dir: PathBuf::from("."),
            search_base_url: String::new(),
            verify_tls: true,
            search_token: None,
            chat_token: None,
            transport: "HTTP".to_owned(),
        }
    }
}

impl std::fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSettings")
            .field("default_result_limit", &self.default_result_limit)
            .field("wait", &self.wait)
            .field("export_dir", &self.export_dir)
            .field("search_base_url", &self.search_base_url)
            .field("verify_tls", &self.verify_tls)
            .field("search_token", &self.search_token.as_ref().map(|_| "[REDACTED]"))
            .field("chat_token", &self.chat_token.as_ref().map(|_| "[REDACTED]"))
            .field("transport", &self.transport)
            .finish()
    }
}
