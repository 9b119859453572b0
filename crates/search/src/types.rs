use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result row: field name to value, in the order the backend sent them.
pub type Row = serde_json::Map<String, Value>;

/// Search window passed along with a dispatch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Earliest time, in the backend's relative or absolute syntax.
    pub earliest: String,
    /// Latest time.
    pub latest: String,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            earliest: "-24h".to_owned(),
            latest: "now".to_owned(),
        }
    }
}

impl TimeRange {
    pub fn new(earliest: impl Into<String>, latest: impl Into<String>) -> Self {
        Self {
            earliest: earliest.into(),
            latest: latest.into(),
        }
    }
}

/// Lifecycle of a search job as seen from this side of the wire.
///
/// The client never cancels or deletes jobs. `TimedOut` only means the local
/// wait budget ran out; the job may still finish on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Done,
    TimedOut,
}

/// Name and description of a saved search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub name: String,
    pub description: String,
}

/// Full description of a saved search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInfo {
    pub name: String,
    pub description: String,
    /// The stored query text.
    pub query: String,
    pub owner: String,
    pub app: String,
    pub updated: String,
}

/// Version probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    pub build: String,
    pub roles: Vec<String>,
}

/// A job as reported by the job listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub sid: String,
    pub is_done: bool,
    /// Server-side run time in seconds.
    pub run_duration: f64,
    pub event_count: u64,
}

impl JobSummary {
    pub fn state(&self) -> JobState {
        if self.is_done {
            JobState::Done
        } else {
            JobState::Running
        }
    }
}

/// An index and how many events it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub name: String,
    pub total_event_count: u64,
}

/// Outcome of dispatching a job and waiting on it.
#[derive(Debug, Clone)]
pub struct JobRun {
    pub sid: String,
    /// Either `Done` or `TimedOut`.
    pub state: JobState,
    /// Fetched rows; always empty unless `state` is `Done`.
    pub rows: Vec<Row>,
}

// ─── Wire formats ────────────────────────────────────────────────────

/// Envelope shared by the management endpoints: `{"entry": [...]}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Feed {
    #[serde(default)]
    pub entry: Vec<FeedEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FeedEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: serde_json::Map<String, Value>,
}

impl Feed {
    /// The first entry, or an empty one when the feed has none.
    pub(crate) fn into_first(self) -> FeedEntry {
        self.entry.into_iter().next().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultsResponse {
    #[serde(default)]
    pub results: Vec<Row>,
}

/// Pull the job id from a dispatch response. The id is either top-level
/// (`{"sid": ...}`) or inside the first entry (`{"entry":[{"content":{"sid": ...}}]}`).
pub(crate) fn extract_sid(payload: &Value) -> Option<String> {
    let top = payload.get("sid").and_then(Value::as_str);
    let nested = || {
        payload
            .get("entry")
            .and_then(|e| e.get(0))
            .and_then(|e| e.get("content"))
            .and_then(|c| c.get("sid"))
            .and_then(Value::as_str)
    };
    top.or_else(nested)
        .filter(|sid| !sid.is_empty())
        .map(str::to_owned)
}

/// The backend reports completion as `true`, `1` or `"1"` depending on version.
pub(crate) fn is_done_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub(crate) fn str_field(content: &serde_json::Map<String, Value>, key: &str) -> String {
    content
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn u64_field(content: &serde_json::Map<String, Value>, key: &str) -> u64 {
    match content.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn f64_field(content: &serde_json::Map<String, Value>, key: &str) -> f64 {
    match content.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sid_top_level() {
        assert_eq!(extract_sid(&json!({"sid": "abc123"})).as_deref(), Some("abc123"));
    }

    #[test]
    fn sid_nested_in_entry() {
        let payload = json!({"entry": [{"content": {"sid": "nested-1"}}]});
        assert_eq!(extract_sid(&payload).as_deref(), Some("nested-1"));
    }

    #[test]
    fn sid_missing_or_empty() {
        assert!(extract_sid(&json!({"messages": []})).is_none());
        assert!(extract_sid(&json!({"sid": ""})).is_none());
        assert!(extract_sid(&json!({"entry": []})).is_none());
    }

    #[test]
    fn done_flag_variants() {
        assert!(is_done_flag(Some(&json!(true))));
        assert!(is_done_flag(Some(&json!(1))));
        assert!(is_done_flag(Some(&json!("1"))));
        assert!(!is_done_flag(Some(&json!(false))));
        assert!(!is_done_flag(Some(&json!(0))));
        assert!(!is_done_flag(Some(&json!("0"))));
        assert!(!is_done_flag(None));
    }

    #[test]
    fn lenient_numbers() {
        let content = json!({"a": 12, "b": "34", "c": 1.5, "d": "x"});
        let content = content.as_object().unwrap();
        assert_eq!(u64_field(content, "a"), 12);
        assert_eq!(u64_field(content, "b"), 34);
        assert_eq!(u64_field(content, "d"), 0);
        assert_eq!(u64_field(content, "missing"), 0);
        assert!((f64_field(content, "c") - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn job_state_serializes_snake_case() {
        assert_eq!(json!(JobState::TimedOut), json!("timed_out"));
        assert_eq!(json!(JobState::Done), json!("done"));
    }

    #[test]
    fn default_time_range() {
        let range = TimeRange::default();
        assert_eq!(range.earliest, "-24h");
        assert_eq!(range.latest, "now");
    }
}
