use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use tutela_audit::{AuditAction, AuditEntry, AuditTrail, ResourceCategory};
use tutela_core::{DataCategory, PurposeCategory, RecordStore, RetentionGround, TutelaError, TutelaResult};

/// Minimum length of an erasure request reason.
const MIN_REASON: usize = 5;

/// Deletes the data tied to a purpose after consent is denied or withdrawn.
///
/// Implemented by [`ErasurePlanner`]; a trait so the consent ledger can be
/// tested with a recording fake.
#[async_trait]
pub trait DataMinimizer: Send + Sync {
    /// Remove the data category backing `purpose` for the subject.
    async fn minimize(&self, subject_id: &str, purpose: PurposeCategory) -> TutelaResult<()>;
}

/// Outcome of an executed erasure request.
///
/// Retained categories are never silently dropped: the caller always learns
/// what was kept and under which legal ground.
#[derive(Debug, Clone, Serialize)]
pub struct ErasureOutcome {
    /// Categories whose records were deleted.
    pub deleted_categories: Vec<DataCategory>,
    /// Categories retained, each with its retention ground.
    pub retained_categories: Vec<(DataCategory, RetentionGround)>,
    /// Human-readable justification when anything was retained.
    pub legal_justification: Option<String>,
}

/// Partitions and executes right-to-erasure requests.
pub struct ErasurePlanner {
    store: Arc<dyn RecordStore>,
    audit: Arc<dyn AuditTrail>,
}

impl ErasurePlanner {
    /// Creates a planner deleting through `store` and writing evidence to
    /// `audit`.
    pub fn new(store: Arc<dyn RecordStore>, audit: Arc<dyn AuditTrail>) -> Self {
        Self { store, audit }
    }

    /// Executes an erasure request for a subject.
    ///
    /// All categories known for the subject are partitioned into deletable
    /// and legally retained; deletable ones are deleted one by one. A
    /// failure mid-execution is surfaced after the audit entry has recorded
    /// the categories actually deleted up to that point.
    pub async fn handle_erasure_request(
        &self,
        subject_id: &str,
        reason: &str,
    ) -> TutelaResult<ErasureOutcome> {
        if reason.chars().count() < MIN_REASON {
            let err = TutelaError::Validation("erasure reason must be provided".to_string());
            self.log_failure(subject_id, &err).await;
            return Err(err);
        }

        let known = self.store.categories(subject_id).await?;
        let mut deletable = Vec::new();
        let mut retained = Vec::new();
        for category in known {
            match category.retention_ground() {
                Some(ground) => retained.push((category, ground)),
                None => deletable.push(category),
            }
        }

        let mut deleted = Vec::new();
        for category in &deletable {
            if let Err(e) = self.store.delete(subject_id, *category).await {
                warn!(
                    subject_id = %subject_id,
                    category = %category,
                    error = %e,
                    "erasure stopped mid-execution"
                );
                // Evidence must reflect what was actually deleted before
                // the error is surfaced.
                self.append_erasure_entry(subject_id, reason, &deleted, &retained, true)
                    .await?;
                return Err(e);
            }
            deleted.push(*category);
        }

        self.append_erasure_entry(subject_id, reason, &deleted, &retained, false)
            .await?;
        info!(
            subject_id = %subject_id,
            deleted = deleted.len(),
            retained = retained.len(),
            "erasure request executed"
        );

        let legal_justification = if retained.is_empty() {
            None
        } else {
            let grounds: Vec<String> = retained.iter().map(|(_, g)| g.to_string()).collect();
            Some(format!(
                "retention required under: {}",
                grounds.join(", ")
            ))
        };

        Ok(ErasureOutcome {
            deleted_categories: deleted,
            retained_categories: retained,
            legal_justification,
        })
    }

    async fn append_erasure_entry(
        &self,
        subject_id: &str,
        reason: &str,
        deleted: &[DataCategory],
        retained: &[(DataCategory, RetentionGround)],
        partial: bool,
    ) -> TutelaResult<()> {
        self.audit
            .append(AuditEntry::new(
                subject_id,
                AuditAction::DataErased,
                ResourceCategory::PrivacyRights,
                serde_json::json!({
                    "reason": reason,
                    "deleted": deleted.len(),
                    "retained": retained.len(),
                    "partial": partial,
                }),
            ))
            .await
    }

    async fn log_failure(&self, subject_id: &str, error: &TutelaError) {
        let _ = self
            .audit
            .append(AuditEntry::new(
                subject_id,
                AuditAction::OperationFailed,
                ResourceCategory::PrivacyRights,
                serde_json::json!({"error": error.to_string()}),
            ))
            .await;
    }
}

#[async_trait]
impl DataMinimizer for ErasurePlanner {
    async fn minimize(&self, subject_id: &str, purpose: PurposeCategory) -> TutelaResult<()> {
        let category = purpose.minimized_category();
        self.store.delete(subject_id, category).await?;
        self.audit
            .append(AuditEntry::new(
                subject_id,
                AuditAction::DataMinimized,
                ResourceCategory::PrivacyRights,
                serde_json::json!({
                    "purpose": purpose,
                    "category": category,
                }),
            ))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tutela_audit::MemoryAuditTrail;
    use tutela_core::MemoryStore;

    async fn seeded_planner() -> (ErasurePlanner, Arc<MemoryStore>, Arc<MemoryAuditTrail>) {
        let store = Arc::new(MemoryStore::new());
        for category in [
            DataCategory::PersonalPreferences,
            DataCategory::LearningHistory,
            DataCategory::EnrollmentRecords,
            DataCategory::AssessmentResults,
        ] {
            store
                .put("user-1", category, serde_json::json!({"seed": true}))
                .await
                .unwrap();
        }
        let audit = Arc::new(MemoryAuditTrail::new());
        (
            ErasurePlanner::new(store.clone(), audit.clone()),
            store,
            audit,
        )
    }

    #[tokio::test]
    async fn test_partition_is_disjoint_and_complete() {
        let (planner, store, _audit) = seeded_planner().await;
        let known_before = store.categories("user-1").await.unwrap();

        let outcome = planner
            .handle_erasure_request("user-1", "leaving the platform")
            .await
            .unwrap();

        let mut all: Vec<DataCategory> = outcome.deleted_categories.clone();
        all.extend(outcome.retained_categories.iter().map(|(c, _)| *c));
        all.sort_by_key(|c| format!("{c}"));
        let mut known = known_before;
        known.sort_by_key(|c| format!("{c}"));
        assert_eq!(all, known);

        for (category, _) in &outcome.retained_categories {
            assert!(!outcome.deleted_categories.contains(category));
        }
    }

    #[tokio::test]
    async fn test_retained_categories_survive_with_justification() {
        let (planner, store, _audit) = seeded_planner().await;
        let outcome = planner
            .handle_erasure_request("user-1", "account closure")
            .await
            .unwrap();

        assert_eq!(
            outcome.retained_categories,
            vec![
                (DataCategory::EnrollmentRecords, RetentionGround::LegalObligation),
                (DataCategory::AssessmentResults, RetentionGround::PublicInterest),
            ]
        );
        let justification = outcome.legal_justification.unwrap();
        assert!(justification.contains("legal_obligation"));
        assert!(justification.contains("public_interest"));

        // Retained records are still there, deletable ones are gone.
        assert!(store
            .get("user-1", DataCategory::EnrollmentRecords)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get("user-1", DataCategory::PersonalPreferences)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_short_reason_rejected() {
        let (planner, _store, audit) = seeded_planner().await;
        let result = planner.handle_erasure_request("user-1", "why").await;
        assert!(matches!(result, Err(TutelaError::Validation(_))));
        // Best-effort failure evidence.
        assert_eq!(audit.len().await, 1);
    }

    #[tokio::test]
    async fn test_erasure_writes_audit_entry() {
        let (planner, _store, audit) = seeded_planner().await;
        planner
            .handle_erasure_request("user-1", "leaving the platform")
            .await
            .unwrap();

        let entries = audit.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::DataErased);
        assert_eq!(entries[0].detail["deleted"], 2);
        assert_eq!(entries[0].detail["retained"], 2);
        assert_eq!(entries[0].detail["partial"], false);
    }

    #[tokio::test]
    async fn test_subject_with_no_data_erases_nothing() {
        let (planner, _store, _audit) = seeded_planner().await;
        let outcome = planner
            .handle_erasure_request("stranger", "never signed up here")
            .await
            .unwrap();
        assert!(outcome.deleted_categories.is_empty());
        assert!(outcome.retained_categories.is_empty());
        assert!(outcome.legal_justification.is_none());
    }

    #[tokio::test]
    async fn test_partial_failure_surfaces_and_audits_partial_count() {
        use tutela_core::DataCategory;

        /// Store that fails deletion of one category.
        struct FailingStore {
            inner: MemoryStore,
            fail_on: DataCategory,
        }

        #[async_trait]
        impl RecordStore for FailingStore {
            async fn get(
                &self,
                subject_id: &str,
                category: DataCategory,
            ) -> TutelaResult<Option<serde_json::Value>> {
                self.inner.get(subject_id, category).await
            }
            async fn put(
                &self,
                subject_id: &str,
                category: DataCategory,
                record: serde_json::Value,
            ) -> TutelaResult<()> {
                self.inner.put(subject_id, category, record).await
            }
            async fn delete(&self, subject_id: &str, category: DataCategory) -> TutelaResult<()> {
                if category == self.fail_on {
                    return Err(TutelaError::ServiceUnavailable(
                        "backing store write failed".to_string(),
                    ));
                }
                self.inner.delete(subject_id, category).await
            }
            async fn categories(&self, subject_id: &str) -> TutelaResult<Vec<DataCategory>> {
                self.inner.categories(subject_id).await
            }
        }

        let inner = MemoryStore::new();
        for category in [
            DataCategory::PersonalPreferences,
            DataCategory::LearningHistory,
        ] {
            inner
                .put("user-1", category, serde_json::json!({}))
                .await
                .unwrap();
        }
        let store = Arc::new(FailingStore {
            inner,
            fail_on: DataCategory::LearningHistory,
        });
        let audit = Arc::new(MemoryAuditTrail::new());
        let planner = ErasurePlanner::new(store, audit.clone());

        let result = planner
            .handle_erasure_request("user-1", "account closure")
            .await;
        assert!(matches!(result, Err(TutelaError::ServiceUnavailable(_))));

        // The audit entry reflects only what was actually deleted.
        let entries = audit.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].detail["deleted"], 1);
        assert_eq!(entries[0].detail["partial"], true);
    }

    #[tokio::test]
    async fn test_minimize_deletes_purpose_category() {
        let (planner, store, audit) = seeded_planner().await;
        planner
            .minimize("user-1", PurposeCategory::DataProcessing)
            .await
            .unwrap();

        assert!(store
            .get("user-1", DataCategory::PersonalPreferences)
            .await
            .unwrap()
            .is_none());
        let entries = audit.entries().await.unwrap();
        assert_eq!(entries[0].action, AuditAction::DataMinimized);
    }
}
