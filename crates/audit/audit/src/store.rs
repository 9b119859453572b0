use async_trait::async_trait;

use crate::error::AuditError;
use crate::record::AuditEntry;

/// Durable, append-only storage for audit entries.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Durably append one entry after every previously appended entry.
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError>;

    /// Read every stored entry in append order.
    ///
    /// Records that cannot be decoded are skipped rather than failing the load.
    async fn load(&self) -> Result<Vec<AuditEntry>, AuditError>;
}
