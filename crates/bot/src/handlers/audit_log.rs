use spyglass_audit::{Actor, AuditAction, AuditError, AuditResult, ExportFormat};

use crate::bot::Bot;
use crate::command::RAW_QUERY_COMMAND;
use crate::error::BotError;
use crate::format::{format_audit_entries, format_search_history};

impl Bot {
    pub(crate) async fn audit_logs(&self, count: usize) -> String {
        let recent = self.audit.recent(count).await;
        let total = self.audit.len().await;
        format_audit_entries(&recent, total)
    }

    pub(crate) async fn search_history(&self, count: usize) -> String {
        let history = self.audit.raw_query_history(RAW_QUERY_COMMAND).await;
        format_search_history(&history, count)
    }

    pub(crate) async fn export_logs(
        &self,
        actor: &Actor,
        format: ExportFormat,
    ) -> Result<String, BotError> {
        let label = format.extension().to_uppercase();
        match self.audit.export(format, &self.settings.export_dir).await {
            Ok(path) => {
                let file = path.display().to_string();
                let total = self.audit.len().await;
                self.record(
                    actor,
                    AuditAction::new(
                        "!export-logs",
                        format!("Exported logs to {label}"),
                        AuditResult::Success,
                    )
                    .with_change("format", format.extension())
                    .with_change("file", file.as_str()),
                )
                .await;
                Ok(format!(
                    "✅ Logs exported to `{file}`\n*Format:* {label}\n*Total entries:* {total}"
                ))
            }
            Err(AuditError::Empty) => {
                self.record(
                    actor,
                    AuditAction::new(
                        "!export-logs",
                        format!("Attempted to export logs to {label}"),
                        AuditResult::Failed,
                    )
                    .with_error("No entries to export"),
                )
                .await;
                Ok("❌ Failed to export logs: the audit trail is empty".to_owned())
            }
            Err(e) => {
                self.record_failure(
                    actor,
                    "!export-logs",
                    &format!("Attempted to export logs to {label}"),
                    &e,
                )
                .await;
                Err(e.into())
            }
        }
    }
}
