//! Command handlers, grouped by concern. Each is an inherent method on
//! [`Bot`](crate::Bot) returning the reply text.

mod admin;
mod audit_log;
mod config;
mod search;
mod status;
