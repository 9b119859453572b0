//! Line-based `KEY=value` configuration file.
//!
//! Comments (`#`) and blank lines are kept verbatim when a key is rewritten.
//! Values may be wrapped in single or double quotes. An unquoted value ends
//! at a `#` preceded by whitespace.
//!
//! Writes are synchronous: the file is a few hundred bytes and is only
//! written under the policy writer lock.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use crate::error::PolicyError;

/// Characters stripped from list entries and identifiers.
const STRAY: &[char] = &['"', '\''];

/// A `KEY=value` file on disk.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the whole file. A missing file reads as empty.
    pub fn load(&self) -> Result<BTreeMap<String, String>, PolicyError> {
        let text = self.read_text()?;
        Ok(text.lines().filter_map(parse_line).collect())
    }

    /// Set one key. See [`set_many`](Self::set_many).
    pub fn set(&self, key: &str, value: &str) -> Result<(), PolicyError> {
        self.set_many(&[(key, value.to_owned())])
    }

    /// Rewrite every line holding one of `updates`' keys in place and append
    /// the keys that were not present, then replace the file atomically.
    pub fn set_many(&self, updates: &[(&str, String)]) -> Result<(), PolicyError> {
        let text = self.read_text()?;
        let mut seen = vec![false; updates.len()];
        let mut out: Vec<String> = Vec::new();

        for line in text.lines() {
            let replaced = parse_line(line).and_then(|(key, _)| {
                updates
                    .iter()
                    .position(|(k, _)| *k == key)
                    .map(|i| (i, format!("{}={}", updates[i].0, updates[i].1)))
            });
            match replaced {
                Some((i, new_line)) => {
                    seen[i] = true;
                    out.push(new_line);
                }
                None => out.push(line.to_owned()),
            }
        }

        for ((key, value), was_seen) in updates.iter().zip(seen) {
            if !was_seen {
                out.push(format!("{key}={value}"));
            }
        }

        let mut body = out.join("\n");
        body.push('\n');
        self.replace_with(body.as_bytes())
    }

    /// Write to a sibling temp file and rename it over the target.
    fn replace_with(&self, body: &[u8]) -> Result<(), PolicyError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|source| self.persistence(source))?;
        tmp.write_all(body)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| self.persistence(source))?;
        tmp.persist(&self.path).map_err(|e| self.persistence(e.error))?;
        Ok(())
    }

    fn read_text(&self) -> Result<String, PolicyError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(self.persistence(source)),
        }
    }

    fn persistence(&self, source: std::io::Error) -> PolicyError {
        PolicyError::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

/// Parse one line into a key and an unquoted value.
///
/// Blank lines, comments and lines without `=` yield `None`. A trailing
/// ` # comment` after an unquoted value is dropped.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_owned(), unquote(strip_comment(value)).to_owned()))
}

/// Drop an inline comment unless the whole value is quoted.
fn strip_comment(raw: &str) -> &str {
    let trimmed = raw.trim();
    if unquote(trimmed).len() != trimmed.len() {
        return trimmed;
    }
    let cut = raw
        .char_indices()
        .find(|&(i, c)| c == '#' && raw[..i].ends_with(char::is_whitespace))
        .map_or(raw.len(), |(i, _)| i);
    raw[..cut].trim()
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Trim whitespace and stray quote characters from an identifier.
pub fn clean_id(raw: &str) -> &str {
    raw.trim().trim_matches(STRAY).trim()
}

/// Split a comma-separated list, cleaning each entry and dropping empties.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(clean_id)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Read a boolean, falling back to `default` for anything unrecognised.
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes" | "on") => true,
        Some("false" | "0" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_handles_quotes_and_comments() {
        assert_eq!(
            parse_line("ADMIN_USER_IDS=\"U1,U2\""),
            Some(("ADMIN_USER_IDS".into(), "U1,U2".into()))
        );
        assert_eq!(parse_line("  KEY = 'v' "), Some(("KEY".into(), "v".into())));
        assert_eq!(parse_line("# KEY=value"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("no equals sign"), None);
        assert_eq!(parse_line("=orphan"), None);
        assert_eq!(parse_line("URL=https://x?a=b"), Some(("URL".into(), "https://x?a=b".into())));
    }

    #[test]
    fn parse_line_drops_inline_comments() {
        assert_eq!(
            parse_line("ADMIN_USER_IDS=U1 # ops lead"),
            Some(("ADMIN_USER_IDS".into(), "U1".into()))
        );
        assert_eq!(parse_line("FLAG=true\t# on"), Some(("FLAG".into(), "true".into())));
        assert_eq!(parse_line("EMPTY= # unset"), Some(("EMPTY".into(), String::new())));
        assert_eq!(
            parse_line("KEY=\"a b\" # quoted"),
            Some(("KEY".into(), "a b".into()))
        );
        assert_eq!(parse_line("KEY='x # y'"), Some(("KEY".into(), "x # y".into())));
        assert_eq!(
            parse_line("URL=https://x?a=b#frag"),
            Some(("URL".into(), "https://x?a=b#frag".into()))
        );
        assert_eq!(parse_line("TAG=#blue"), Some(("TAG".into(), "#blue".into())));
    }

    #[test]
    fn commented_roster_loads_clean_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ADMIN_USER_IDS=U1,U2 # ops leads\n").unwrap();

        let loaded = EnvFile::new(&path).load().unwrap();
        assert_eq!(parse_list(&loaded["ADMIN_USER_IDS"]), vec!["U1", "U2"]);
    }

    #[test]
    fn parse_list_strips_quotes_and_whitespace() {
        assert_eq!(
            parse_list(" U1 , 'U2',\"U3\" ,, "),
            vec!["U1".to_owned(), "U2".to_owned(), "U3".to_owned()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn parse_bool_defaults() {
        assert!(parse_bool(Some("TRUE"), false));
        assert!(!parse_bool(Some("false"), true));
        assert!(parse_bool(None, true));
        assert!(!parse_bool(Some("maybe"), false));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = EnvFile::new(dir.path().join(".env"));
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn set_rewrites_in_place_and_preserves_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# bot settings\nSEARCH_URL=https://search:8089\n\nRESULT_LIMIT=5\n",
        )
        .unwrap();

        let file = EnvFile::new(&path);
        file.set("RESULT_LIMIT", "10").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "# bot settings\nSEARCH_URL=https://search:8089\n\nRESULT_LIMIT=10\n"
        );
    }

    #[test]
    fn set_appends_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "A=1").unwrap();

        let file = EnvFile::new(&path);
        file.set_many(&[("A", "2".into()), ("B", "x,y".into())]).unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded["A"], "2");
        assert_eq!(loaded["B"], "x,y");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A=2\nB=x,y\n");
    }

    #[test]
    fn set_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = EnvFile::new(dir.path().join("fresh.env"));
        file.set("ENABLE_SPL_QUERY", "false").unwrap();
        assert_eq!(file.load().unwrap()["ENABLE_SPL_QUERY"], "false");
    }

    #[test]
    fn set_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "A=1\n").unwrap();

        let file = EnvFile::new(&path);
        file.set("A", "2").unwrap();
        file.set("B", "3").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(".env")]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A=2\nB=3\n");
    }

    #[test]
    fn unwritable_path_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = EnvFile::new(dir.path().join("missing-dir").join(".env"));
        let err = file.set("A", "1").unwrap_err();
        assert!(matches!(err, PolicyError::Persistence { .. }));
    }
}
