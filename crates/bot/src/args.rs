//! Pure argument parsing shared by the command parsers.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// `<@U123>` or `<@U123|name>` as rendered by the chat client.
static USER_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<@([UW][A-Z0-9]+)(?:\|[^>]*)?>").expect("user mention regex is valid")
});

/// `<#C123|name>` or `<#C123>`.
static CHANNEL_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<#(C[A-Z0-9]+)(?:\|[^>]*)?>").expect("channel mention regex is valid")
});

static BARE_USER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[UW][A-Z0-9]+$").expect("user id regex is valid"));

static BARE_CHANNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^C[A-Z0-9]+$").expect("channel id regex is valid"));

/// A leading name plus `key=value` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub name: Option<String>,
    pub params: BTreeMap<String, String>,
}

impl Args {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Split `text` into a leading name and `key=value` parameters.
///
/// The name is the first token, or a double-quoted phrase so that names
/// with spaces work. Later tokens without `=` are ignored. A repeated key
/// keeps its last value.
pub fn parse_args(text: &str) -> Args {
    let text = text.trim();
    if text.is_empty() {
        return Args::default();
    }

    let (name, rest) = match text.strip_prefix('"').and_then(|t| t.split_once('"')) {
        Some((quoted, rest)) => (quoted.trim().to_owned(), rest),
        None => match text.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_owned(), rest),
            None => (text.to_owned(), ""),
        },
    };

    let params = rest
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .collect();

    Args {
        name: (!name.is_empty()).then_some(name),
        params,
    }
}

/// A user id from a mention anywhere in `text`, or a bare id as the first
/// token.
pub fn user_id(text: &str) -> Option<String> {
    if let Some(caps) = USER_MENTION_RE.captures(text) {
        return Some(caps[1].to_owned());
    }
    text.split_whitespace()
        .next()
        .filter(|t| BARE_USER_RE.is_match(t))
        .map(str::to_owned)
}

/// A channel id from a mention anywhere in `text`, or a bare id as the
/// first token.
pub fn channel_id(text: &str) -> Option<String> {
    if let Some(caps) = CHANNEL_MENTION_RE.captures(text) {
        return Some(caps[1].to_owned());
    }
    text.split_whitespace()
        .next()
        .filter(|t| BARE_CHANNEL_RE.is_match(t))
        .map(str::to_owned)
}

/// Optional count argument clamped to `1..=max`; anything unparsable
/// yields `default`.
pub fn count(text: &str, default: usize, max: usize) -> usize {
    text.split_whitespace()
        .next()
        .and_then(|t| t.parse::<usize>().ok())
        .map_or(default, |n| n.clamp(1, max))
}

/// The first `max` characters of `text`.
pub fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Strip one pair of surrounding double quotes.
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_params() {
        let args = parse_args("failed_logins earliest=-2h limit=10 stray");
        assert_eq!(args.name.as_deref(), Some("failed_logins"));
        assert_eq!(args.param("earliest"), Some("-2h"));
        assert_eq!(args.param("limit"), Some("10"));
        assert_eq!(args.param("latest"), None);
        assert_eq!(args.params.len(), 2);
    }

    #[test]
    fn quoted_name_keeps_spaces() {
        let args = parse_args("\"My Saved Search\" latest=now");
        assert_eq!(args.name.as_deref(), Some("My Saved Search"));
        assert_eq!(args.param("latest"), Some("now"));
    }

    #[test]
    fn value_may_contain_equals() {
        let args = parse_args("s filter=a=b");
        assert_eq!(args.param("filter"), Some("a=b"));
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_args("   "), Args::default());
    }

    #[test]
    fn extracts_user_ids() {
        assert_eq!(user_id("<@U123ABC>").as_deref(), Some("U123ABC"));
        assert_eq!(user_id("please add <@U9|bob> now").as_deref(), Some("U9"));
        assert_eq!(user_id("U42").as_deref(), Some("U42"));
        assert_eq!(user_id("u42"), None);
        assert_eq!(user_id("@bob"), None);
        assert_eq!(user_id(""), None);
    }

    #[test]
    fn extracts_channel_ids() {
        assert_eq!(channel_id("<#C01AB|ops>").as_deref(), Some("C01AB"));
        assert_eq!(channel_id("<#C01AB>").as_deref(), Some("C01AB"));
        assert_eq!(channel_id("C777").as_deref(), Some("C777"));
        assert_eq!(channel_id("#ops"), None);
    }

    #[test]
    fn count_defaults_and_clamps() {
        assert_eq!(count("", 10, 50), 10);
        assert_eq!(count("abc", 10, 50), 10);
        assert_eq!(count("20", 10, 50), 20);
        assert_eq!(count("500", 10, 50), 50);
        assert_eq!(count("0", 10, 50), 1);
    }

    #[test]
    fn preview_counts_chars() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("ab", 50), "ab");
    }

    #[test]
    fn unquote_strips_one_pair() {
        assert_eq!(unquote("\"index=main | head 5\""), "index=main | head 5");
        assert_eq!(unquote("index=main"), "index=main");
        assert_eq!(unquote("\"open"), "\"open");
    }
}
