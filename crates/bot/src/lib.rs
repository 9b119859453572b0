//! Chat command dispatcher.
//!
//! Messages starting with `!` are matched against a static command table,
//! checked against the [`AuthorizationPolicy`](spyglass_policy::AuthorizationPolicy),
//! run against the search backend or the policy, recorded in the audit trail
//! where privileged, and answered with exactly one reply.

pub mod args;
pub mod bot;
pub mod command;
pub mod error;
pub mod format;
mod handlers;
pub mod message;
pub mod respond;
pub mod settings;

pub use bot::{Bot, DENIED_PREVIEW_LEN, EXECUTED_PREVIEW_LEN};
pub use command::{COMMANDS, Command, CommandSpec, Gate, RAW_QUERY_COMMAND};
pub use error::{BotError, ValidationError};
pub use format::format_results;
pub use message::IncomingMessage;
pub use respond::{CollectingResponder, Responder};
pub use settings::BotSettings;
