//! Serialisations of the audit trail for export.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::AuditError;
use crate::record::AuditEntry;

/// Column order of the CSV export.
pub const CSV_COLUMNS: [&str; 10] = [
    "timestamp",
    "user_id",
    "user_name",
    "command",
    "channel_id",
    "channel_name",
    "action",
    "result",
    "changes",
    "error",
];

const TXT_TITLE: &str = "SPYGLASS - AUDIT LOG EXPORT";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "txt" | "text" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    /// Default output file name, e.g. `logs_export.csv`.
    pub fn file_name(self) -> String {
        format!("logs_export.{}", self.extension())
    }

    /// Render `entries` in this format.
    pub fn render(self, entries: &[AuditEntry], generated: DateTime<Utc>) -> Result<String, AuditError> {
        match self {
            Self::Json => render_json(entries),
            Self::Csv => render_csv(entries),
            Self::Txt => Ok(render_txt(entries, generated)),
        }
    }
}

/// A pretty-printed JSON array of entries.
pub fn render_json(entries: &[AuditEntry]) -> Result<String, AuditError> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// RFC 4180 CSV with a header row. Fails with [`AuditError::Empty`] when
/// there is nothing to export.
pub fn render_csv(entries: &[AuditEntry]) -> Result<String, AuditError> {
    if entries.is_empty() {
        return Err(AuditError::Empty);
    }

    let mut out = CSV_COLUMNS.join(",");
    out.push_str("\r\n");
    for e in entries {
        let fields = [
            e.timestamp_rfc3339(),
            e.user_id.clone(),
            e.user_name.clone(),
            e.command.clone(),
            e.channel_id.clone(),
            e.channel_name.clone(),
            e.action.clone(),
            e.result.to_string(),
            e.changes_json(),
            e.error.clone().unwrap_or_default(),
        ];
        let row: Vec<Cow<'_, str>> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    Ok(out)
}

/// Quote a field when it holds a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Human-readable report: a header, then one block per entry.
pub fn render_txt(entries: &[AuditEntry], generated: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TXT_TITLE}");
    let _ = writeln!(
        out,
        "Generated: {}",
        generated.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let _ = writeln!(out, "Total Entries: {}", entries.len());
    let _ = writeln!(out, "{}\n", "=".repeat(80));

    for e in entries {
        let _ = writeln!(out, "Date/Time:  {}", e.timestamp_rfc3339());
        let _ = writeln!(out, "User:       {} ({})", e.user_name, e.user_id);
        let _ = writeln!(out, "Channel:    {} ({})", e.channel_name, e.channel_id);
        let _ = writeln!(out, "Command:    {}", e.command);
        let _ = writeln!(out, "Action:     {}", e.action);
        let _ = writeln!(out, "Result:     {}", e.result);
        if !e.changes.is_empty() {
            let _ = writeln!(out, "Changes:    {}", e.changes_json());
        }
        if let Some(error) = e.error.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "Error:      {error}");
        }
        let _ = writeln!(out, "{}\n", "-".repeat(80));
    }
    out
}
