use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome recorded for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditResult {
    Success,
    Failed,
    Denied,
}

impl AuditResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Denied => "DENIED",
        }
    }
}

impl fmt::Display for AuditResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who did something, and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    pub channel_name: String,
}

impl Actor {
    /// An actor whose display names default to their ids.
    pub fn new(user_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let channel_id = channel_id.into();
        Self {
            user_name: user_id.clone(),
            channel_name: channel_id.clone(),
            user_id,
            channel_id,
        }
    }

    #[must_use]
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    #[must_use]
    pub fn with_channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = name.into();
        self
    }
}

/// What happened: the caller-supplied half of an [`AuditEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuditAction {
    pub command: String,
    pub action: String,
    pub result: AuditResult,
    pub changes: Map<String, Value>,
    pub error: Option<String>,
}

impl AuditAction {
    pub fn new(command: impl Into<String>, action: impl Into<String>, result: AuditResult) -> Self {
        Self {
            command: command.into(),
            action: action.into(),
            result,
            changes: Map::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_change(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// One immutable record in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub command: String,
    pub channel_id: String,
    pub channel_name: String,
    /// Human-readable description of the action.
    pub action: String,
    pub result: AuditResult,
    #[serde(default)]
    pub changes: Map<String, Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AuditEntry {
    pub fn new(timestamp: DateTime<Utc>, actor: &Actor, action: AuditAction) -> Self {
        Self {
            timestamp,
            user_id: actor.user_id.clone(),
            user_name: actor.user_name.clone(),
            command: action.command,
            channel_id: actor.channel_id.clone(),
            channel_name: actor.channel_name.clone(),
            action: action.action,
            result: action.result,
            changes: action.changes,
            error: action.error,
        }
    }

    /// RFC 3339 timestamp at full stored precision.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// `YYYY-MM-DD HH:MM:SS`, for chat display only.
    pub fn date_time(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// `changes` as compact JSON text.
    pub fn changes_json(&self) -> String {
        Value::Object(self.changes.clone()).to_string()
    }
}
