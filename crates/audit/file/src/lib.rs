//! Audit store that appends one JSON object per line to a local file.

mod store;

pub use store::FileAuditStore;
