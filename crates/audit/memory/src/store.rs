use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use spyglass_audit::error::AuditError;
use spyglass_audit::record::AuditEntry;
use spyglass_audit::store::AuditStore;

/// In-memory audit store. Suitable for development and testing.
///
/// Writes can be made to fail on demand to exercise the trail's
/// best-effort durability.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    entries: Mutex<Vec<AuditEntry>>,
    fail_writes: AtomicBool,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Everything stored so far.
    pub fn stored(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuditError::Storage("memory store is failing writes".into()));
        }
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self.stored())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use spyglass_audit::{Actor, AuditAction, AuditResult, AuditTrail};

    use super::*;

    #[tokio::test]
    async fn append_and_load() {
        let store = MemoryAuditStore::new();
        let trail = AuditTrail::open(Arc::new(MemoryAuditStore::new())).await.unwrap();
        trail
            .log_action(&Actor::new("U1", "C1"), AuditAction::new("!a", "a", AuditResult::Success))
            .await
            .unwrap();
        let entry = trail.entries().await.remove(0);

        store.append(&entry).await.unwrap();
        assert_eq!(store.load().await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn failing_writes_toggle() {
        let store = Arc::new(MemoryAuditStore::new());
        let trail = AuditTrail::open(store.clone()).await.unwrap();
        let actor = Actor::new("U1", "C1");

        store.set_fail_writes(true);
        assert!(trail
            .log_action(&actor, AuditAction::new("!a", "a", AuditResult::Success))
            .await
            .is_err());

        store.set_fail_writes(false);
        trail
            .log_action(&actor, AuditAction::new("!b", "b", AuditResult::Success))
            .await
            .unwrap();

        assert_eq!(trail.len().await, 2);
        assert_eq!(store.stored().len(), 1);
        assert_eq!(store.stored()[0].command, "!b");
    }
}
