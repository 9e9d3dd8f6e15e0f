use crate::{AuditEntry, AuditTrail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;
use tutela_core::{TutelaError, TutelaResult};

/// File-backed audit trail: one JSON object per line, append-only.
///
/// Unlike an ordinary application log, appends here are awaited and fsync'd
/// before `Ok` is returned: the entry is compliance evidence and the
/// operation it records must not succeed without it.
pub struct JsonlAuditTrail {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAuditTrail {
    /// Creates a trail that appends to `audit.jsonl` under `log_dir`.
    pub fn new(log_dir: impl AsRef<Path>) -> Self {
        Self {
            path: log_dir.as_ref().join("audit.jsonl"),
            write_lock: Mutex::new(()),
        }
    }

    /// The file the trail appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditTrail for JsonlAuditTrail {
    async fn append(&self, entry: AuditEntry) -> TutelaResult<()> {
        let line = serde_json::to_string(&entry)
            .map_err(|e| TutelaError::Audit(format!("serializing audit entry: {e}")))?;

        // Serialize writers so interleaved appends cannot split a line.
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TutelaError::Audit(format!("creating audit dir: {e}")))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| TutelaError::Audit(format!("opening audit log: {e}")))?;

        file.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| TutelaError::Audit(format!("writing audit entry: {e}")))?;
        file.sync_data()
            .await
            .map_err(|e| TutelaError::Audit(format!("syncing audit log: {e}")))?;

        info!(
            subject_id = %entry.subject_id,
            action = %entry.action,
            "audit"
        );
        Ok(())
    }

    async fn entries(&self) -> TutelaResult<Vec<AuditEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TutelaError::Audit(format!("reading audit log: {e}")))?;

        let mut entries = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let entry: AuditEntry = serde_json::from_str(line)
                .map_err(|e| TutelaError::Audit(format!("corrupt audit entry: {e}")))?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
