//! Slack transport.
//!
//! Inbound messages arrive through the Events API and are decoded with
//! [`EventEnvelope`]; replies go out through [`SlackResponder`], which posts
//! to the channel the command came from.

pub mod client;
pub mod config;
pub mod error;
pub mod responder;
pub mod types;

pub use client::SlackClient;
pub use config::{DEFAULT_API_BASE_URL, SlackConfig};
pub use error::SlackError;
pub use responder::SlackResponder;
pub use types::{ApiResponse, EventEnvelope, MessageEvent, PostMessageRequest};
