//! Append-only audit trail.
//!
//! Every privileged action is recorded as an [`AuditEntry`] into an ordered
//! in-memory sequence and a durable [`AuditStore`]. Entries are never changed
//! or removed. The trail can be exported as JSON, CSV or plain text.

pub mod error;
pub mod export;
pub mod record;
pub mod store;
pub mod trail;

pub use error::AuditError;
pub use export::ExportFormat;
pub use record::{Actor, AuditAction, AuditEntry, AuditResult};
pub use store::AuditStore;
pub use trail::AuditTrail;
