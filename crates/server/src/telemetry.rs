//! Operational logging setup.
//!
//! A `fmt` layer writes to stderr; when `[logging] file` is set, a second
//! `fmt` layer without ANSI colours appends to that file.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingSection;
use crate::error::ServerError;

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter.
pub fn init(config: &LoggingSection) -> Result<(), ServerError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| ServerError::Config(format!("tracing already initialised: {e}")))
}
