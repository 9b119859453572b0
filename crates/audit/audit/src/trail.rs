use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::AuditError;
use crate::export::ExportFormat;
use crate::record::{Actor, AuditAction, AuditEntry};
use crate::store::AuditStore;

/// The live audit trail: an ordered in-memory cache in front of a durable
/// append-only store.
///
/// The mutex is held across the durable append so that in-memory order,
/// stored order and call order always agree.
pub struct AuditTrail {
    store: Arc<dyn AuditStore>,
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditTrail {
    /// Open a trail, replaying everything the store already holds.
    pub async fn open(store: Arc<dyn AuditStore>) -> Result<Self, AuditError> {
        let entries = store.load().await?;
        info!(entries = entries.len(), "audit trail loaded");
        Ok(Self {
            store,
            entries: Mutex::new(entries),
        })
    }

    /// Record one action.
    ///
    /// The entry is always kept in memory. An `Err` only means the durable
    /// append failed; the failure is also logged here.
    pub async fn log_action(&self, actor: &Actor, action: AuditAction) -> Result<(), AuditError> {
        let mut entries = self.entries.lock().await;

        // Never step backwards, even if the wall clock does.
        let now = Utc::now();
        let timestamp = entries.last().map_or(now, |last| last.timestamp.max(now));
        let entry = AuditEntry::new(timestamp, actor, action);

        echo(&entry);
        let persisted = self.store.append(&entry).await;
        entries.push(entry);
        drop(entries);

        if let Err(e) = &persisted {
            error!(error = %e, "failed to persist audit entry; kept in memory only");
        }
        persisted
    }

    /// The last `limit` entries, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock().await;
        let start = entries.len().saturating_sub(limit);
        entries[start..].to_vec()
    }

    /// Every entry, oldest first.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn entries_for_user(&self, user_id: &str) -> Vec<AuditEntry> {
        self.filtered(|e| e.user_id == user_id).await
    }

    pub async fn entries_for_command(&self, command: &str) -> Vec<AuditEntry> {
        self.filtered(|e| e.command == command).await
    }

    /// Entries recorded by `raw_query_command` or whose action mentions SPL.
    pub async fn raw_query_history(&self, raw_query_command: &str) -> Vec<AuditEntry> {
        self.filtered(|e| e.command == raw_query_command || e.action.contains("SPL"))
            .await
    }

    /// Write the whole trail to `dir` in `format` and return the file path.
    pub async fn export(&self, format: ExportFormat, dir: &Path) -> Result<PathBuf, AuditError> {
        let entries = self.entries().await;
        let body = format.render(&entries, Utc::now())?;
        let path = dir.join(format.file_name());
        tokio::fs::write(&path, body).await?;
        info!(path = %path.display(), entries = entries.len(), "audit trail exported");
        Ok(path)
    }

    async fn filtered(&self, keep: impl Fn(&AuditEntry) -> bool) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| keep(e))
            .cloned()
            .collect()
    }
}

/// Mirror an entry to the operational log.
fn echo(entry: &AuditEntry) {
    info!(
        target: "spyglass::audit",
        when = %entry.date_time(),
        user = %format!("{} ({})", entry.user_name, entry.user_id),
        channel = %format!("{} ({})", entry.channel_name, entry.channel_id),
        command = %entry.command,
        result = %entry.result,
        changes = %entry.changes_json(),
        error = entry.error.as_deref().unwrap_or(""),
        "{}",
        entry.action
    );
}
