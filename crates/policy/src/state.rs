use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::env_file::{clean_id, parse_bool, parse_list};

pub const ADMIN_USER_IDS: &str = "ADMIN_USER_IDS";
pub const ADMIN_CHANNEL_IDS: &str = "ADMIN_CHANNEL_IDS";
pub const ENABLE_SPL_QUERY: &str = "ENABLE_SPL_QUERY";
pub const REQUIRE_SPL_APPROVAL: &str = "REQUIRE_SPL_APPROVAL";
pub const RESULT_LIMIT: &str = "RESULT_LIMIT";

/// Feature flags that can be toggled at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlag {
    /// Raw query execution.
    RawQuery,
    /// Approval before raw queries run. Tracked only.
    ApprovalRequired,
}

impl FeatureFlag {
    /// Parse a flag from its name or alias.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "spl_query" | "spl" => Some(Self::RawQuery),
            "approval" | "require_approval" => Some(Self::ApprovalRequired),
            _ => None,
        }
    }

    /// Canonical name, as accepted by [`from_name`](Self::from_name).
    pub fn name(self) -> &'static str {
        match self {
            Self::RawQuery => "spl_query",
            Self::ApprovalRequired => "approval",
        }
    }

    /// Key the flag is persisted under.
    pub fn env_key(self) -> &'static str {
        match self {
            Self::RawQuery => ENABLE_SPL_QUERY,
            Self::ApprovalRequired => REQUIRE_SPL_APPROVAL,
        }
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawQuery => write!(f, "SPL Query"),
            Self::ApprovalRequired => write!(f, "SPL Approval"),
        }
    }
}

/// One immutable snapshot of the roster, allowlist and flags.
///
/// Mutations build a new snapshot; readers never see a half-applied change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyState {
    /// Admin user ids in insertion order.
    pub admins: Vec<String>,
    /// Channel allowlist in insertion order. Empty means every channel.
    pub channels: Vec<String>,
    pub spl_enabled: bool,
    pub approval_required: bool,
    /// Persisted result limit override, if any.
    pub result_limit: Option<usize>,
}

impl Default for PolicyState {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            channels: Vec::new(),
            spl_enabled: true,
            approval_required: false,
            result_limit: None,
        }
    }
}

impl PolicyState {
    /// Build state from parsed `KEY=value` pairs.
    pub fn from_values(values: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| values.get(key).map(String::as_str);
        Self {
            admins: dedup(parse_list(get(ADMIN_USER_IDS).unwrap_or_default())),
            channels: dedup(parse_list(get(ADMIN_CHANNEL_IDS).unwrap_or_default())),
            spl_enabled: parse_bool(get(ENABLE_SPL_QUERY), true),
            approval_required: parse_bool(get(REQUIRE_SPL_APPROVAL), false),
            result_limit: get(RESULT_LIMIT)
                .and_then(|v| v.trim().parse().ok())
                .filter(|n| *n > 0),
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        let id = clean_id(user_id);
        !id.is_empty() && self.admins.iter().any(|a| a == id)
    }

    pub fn is_admin_channel(&self, channel_id: &str) -> bool {
        let id = clean_id(channel_id);
        self.channels.iter().any(|c| c == id)
    }

    pub fn flag(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::RawQuery => self.spl_enabled,
            FeatureFlag::ApprovalRequired => self.approval_required,
        }
    }

    pub(crate) fn set_flag(&mut self, flag: FeatureFlag, value: bool) {
        match flag {
            FeatureFlag::RawQuery => self.spl_enabled = value,
            FeatureFlag::ApprovalRequired => self.approval_required = value,
        }
    }

    pub(crate) fn admins_value(&self) -> String {
        self.admins.join(",")
    }

    pub(crate) fn channels_value(&self) -> String {
        self.channels.join(",")
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn defaults_when_empty() {
        let state = PolicyState::from_values(&BTreeMap::new());
        assert_eq!(state, PolicyState::default());
        assert!(state.spl_enabled);
        assert!(!state.approval_required);
    }

    #[test]
    fn parses_all_keys() {
        let state = PolicyState::from_values(&values(&[
            (ADMIN_USER_IDS, "U1, 'U2',U1"),
            (ADMIN_CHANNEL_IDS, "C9"),
            (ENABLE_SPL_QUERY, "false"),
            (REQUIRE_SPL_APPROVAL, "true"),
            (RESULT_LIMIT, "12"),
        ]));
        assert_eq!(state.admins, ["U1", "U2"]);
        assert_eq!(state.channels, ["C9"]);
        assert!(!state.spl_enabled);
        assert!(state.approval_required);
        assert_eq!(state.result_limit, Some(12));
    }

    #[test]
    fn bad_result_limit_is_ignored() {
        let state = PolicyState::from_values(&values(&[(RESULT_LIMIT, "lots")]));
        assert_eq!(state.result_limit, None);
        let state = PolicyState::from_values(&values(&[(RESULT_LIMIT, "0")]));
        assert_eq!(state.result_limit, None);
    }

    #[test]
    fn is_admin_tolerates_quotes_but_not_case() {
        let state = PolicyState {
            admins: vec!["U123ABC".into()],
            ..PolicyState::default()
        };
        assert!(state.is_admin("U123ABC"));
        assert!(state.is_admin(" \"U123ABC\" "));
        assert!(state.is_admin("'U123ABC'"));
        assert!(!state.is_admin("u123abc"));
        assert!(!state.is_admin(""));
        assert!(!state.is_admin("\"\""));
    }

    #[test]
    fn feature_flag_aliases() {
        assert_eq!(FeatureFlag::from_name("spl"), Some(FeatureFlag::RawQuery));
        assert_eq!(FeatureFlag::from_name("SPL_QUERY"), Some(FeatureFlag::RawQuery));
        assert_eq!(
            FeatureFlag::from_name("require_approval"),
            Some(FeatureFlag::ApprovalRequired)
        );
        assert_eq!(FeatureFlag::from_name("turbo"), None);
    }
}
