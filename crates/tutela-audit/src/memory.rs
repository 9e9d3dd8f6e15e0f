use crate::{AuditEntry, AuditTrail};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use tutela_core::TutelaResult;

/// In-memory audit trail.
///
/// Append-only like its file-backed sibling; used by tests and by
/// deployments that export entries through their own durable sink.
pub struct MemoryAuditTrail {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditTrail {
    /// Creates an empty trail.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Number of entries appended so far.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the trail is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryAuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditTrail for MemoryAuditTrail {
    async fn append(&self, entry: AuditEntry) -> TutelaResult<()> {
        info!(
            subject_id = %entry.subject_id,
            action = %entry.action,
            "audit"
        );
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn entries(&self) -> TutelaResult<Vec<AuditEntry>> {
        Ok(self.entries.read().await.clone())
    }
}
