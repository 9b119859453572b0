use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the authorization policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The named feature flag does not exist.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// The mutation would leave the roster without any admin.
    #[error("cannot remove {0}: they are the last remaining admin")]
    LastAdmin(String),

    /// A setting value was rejected before anything was written.
    #[error("invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Reading or writing the key=value file failed.
    #[error("config file {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_admin_display() {
        let err = PolicyError::LastAdmin("U1".into());
        assert_eq!(
            err.to_string(),
            "cannot remove U1: they are the last remaining admin"
        );
    }

    #[test]
    fn persistence_display_names_path() {
        let err = PolicyError::Persistence {
            path: PathBuf::from("/nope/.env"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nope/.env"));
        assert!(msg.contains("denied"));
    }
}
