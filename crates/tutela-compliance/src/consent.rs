use crate::erasure::DataMinimizer;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tutela_audit::{AuditAction, AuditEntry, AuditTrail, ResourceCategory};
use tutela_core::{LegalBasis, PurposeCategory, TutelaError, TutelaResult};
use uuid::Uuid;

/// Consent older than this is no longer valid and must be re-requested.
/// Fixed 730-day window; approximates two calendar years, ignoring leap
/// days. Hard business rule, not configurable per call.
const VALIDITY_DAYS: i64 = 730;

/// Minimum length of a consent purpose description.
const MIN_PURPOSE_TEXT: usize = 10;

/// Lifecycle state of a consent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentStatus {
    /// Requested, awaiting the subject's response.
    Pending,
    /// Granted by the subject.
    Granted,
    /// Denied by the subject.
    Denied,
    /// Replaced by a later request before a response arrived.
    Superseded,
}

/// A consent record. Immutable history: records are superseded, never
/// deleted, and transition out of [`ConsentStatus::Pending`] exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Unique record id.
    pub id: Uuid,
    /// The subject the consent concerns.
    pub subject_id: String,
    /// The processing purpose consented to.
    pub purpose: PurposeCategory,
    /// Current lifecycle state.
    pub status: ConsentStatus,
    /// When the request was created.
    pub requested_at: DateTime<Utc>,
    /// When the subject responded, if they have.
    pub responded_at: Option<DateTime<Utc>>,
    /// Source IP of the requesting call.
    pub source_ip: String,
    /// User agent of the requesting call.
    pub user_agent: String,
    /// Legal basis for processing under this purpose.
    pub legal_basis: LegalBasis,
    /// Free-text purpose description shown to the subject.
    pub purpose_text: String,
}

/// Aggregate ledger statistics consumed by the compliance reporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerStats {
    /// Requests still awaiting a response.
    pub pending: usize,
    /// Latest grants still inside the validity window.
    pub granted_active: usize,
    /// Latest grants past the validity window.
    pub granted_expired: usize,
    /// Subjects holding an active third-party-sharing grant without an
    /// active data-processing grant.
    pub sharing_without_processing: usize,
}

/// Tracks consent requests and responses per subject and purpose.
///
/// Each subject's record list sits behind its own mutex, so concurrent
/// operations on unrelated subjects never serialize. The ledger owns the
/// records; everything else reads through queries.
pub struct ConsentLedger {
    subjects: RwLock<HashMap<String, Arc<Mutex<Vec<ConsentRecord>>>>>,
    audit: Arc<dyn AuditTrail>,
    minimizer: Arc<dyn DataMinimizer>,
}

impl ConsentLedger {
    /// Creates a ledger writing evidence to `audit` and delegating
    /// denial-triggered minimization to `minimizer`.
    pub fn new(audit: Arc<dyn AuditTrail>, minimizer: Arc<dyn DataMinimizer>) -> Self {
        Self {
            subjects: RwLock::new(HashMap::new()),
            audit,
            minimizer,
        }
    }

    async fn subject_list(&self, subject_id: &str) -> Arc<Mutex<Vec<ConsentRecord>>> {
        if let Some(list) = self.subjects.read().await.get(subject_id) {
            return list.clone();
        }
        let mut subjects = self.subjects.write().await;
        subjects
            .entry(subject_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    /// Creates a pending consent request for `(subject, purpose)`.
    ///
    /// A still-pending earlier request for the same pair is superseded, so
    /// at most one pending record exists per pair. The audit write happens
    /// before the ledger mutation; if it fails, nothing changes.
    pub async fn request_consent(
        &self,
        subject_id: &str,
        purpose: PurposeCategory,
        purpose_text: &str,
        source_ip: &str,
        user_agent: &str,
    ) -> TutelaResult<ConsentRecord> {
        if purpose_text.chars().count() < MIN_PURPOSE_TEXT {
            let err = TutelaError::Validation(
                "consent purpose must be clearly specified (at least 10 characters)".to_string(),
            );
            self.log_failure(subject_id, &err).await;
            return Err(err);
        }

        let record = ConsentRecord {
            id: Uuid::new_v4(),
            subject_id: subject_id.to_string(),
            purpose,
            status: ConsentStatus::Pending,
            requested_at: Utc::now(),
            responded_at: None,
            source_ip: source_ip.to_string(),
            user_agent: user_agent.to_string(),
            legal_basis: purpose.legal_basis(),
            purpose_text: purpose_text.to_string(),
        };

        let list = self.subject_list(subject_id).await;
        let mut records = list.lock().await;

        self.audit
            .append(
                AuditEntry::new(
                    subject_id,
                    AuditAction::ConsentRequested,
                    ResourceCategory::ConsentManagement,
                    serde_json::json!({
                        "record_id": record.id,
                        "purpose": purpose,
                        "legal_basis": record.legal_basis,
                    }),
                )
                .with_source(source_ip, user_agent),
            )
            .await?;

        for existing in records.iter_mut() {
            if existing.purpose == purpose && existing.status == ConsentStatus::Pending {
                existing.status = ConsentStatus::Superseded;
            }
        }
        records.push(record.clone());
        Ok(record)
    }

    /// Records the subject's response to the most recent pending request
    /// for `(subject, purpose)`.
    ///
    /// A denial triggers data minimization for the purpose through the
    /// configured [`DataMinimizer`]. The response itself is committed and
    /// audited before minimization runs: a minimization failure surfaces as
    /// an error while the recorded denial stands, and an `operation_failed`
    /// entry marks the minimization as outstanding.
    pub async fn record_consent_response(
        &self,
        subject_id: &str,
        purpose: PurposeCategory,
        granted: bool,
        source_ip: &str,
    ) -> TutelaResult<()> {
        let list = self.subject_list(subject_id).await;
        {
            let mut records = list.lock().await;

            let position = records
                .iter()
                .rposition(|r| r.purpose == purpose && r.status == ConsentStatus::Pending);
            let Some(position) = position else {
                drop(records);
                let err = TutelaError::Compliance("no pending consent request".to_string());
                self.log_failure(subject_id, &err).await;
                return Err(err);
            };

            self.audit
                .append(
                    AuditEntry::new(
                        subject_id,
                        AuditAction::ConsentResponded,
                        ResourceCategory::ConsentManagement,
                        serde_json::json!({
                            "record_id": records[position].id,
                            "purpose": purpose,
                            "granted": granted,
                        }),
                    )
                    .with_source(source_ip, "system"),
                )
                .await?;

            records[position].status = if granted {
                ConsentStatus::Granted
            } else {
                ConsentStatus::Denied
            };
            records[position].responded_at = Some(Utc::now());
        }

        if !granted {
            if let Err(e) = self.minimizer.minimize(subject_id, purpose).await {
                self.log_failure(subject_id, &e).await;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Whether the subject currently holds valid consent for the purpose.
    pub async fn has_valid_consent(&self, subject_id: &str, purpose: PurposeCategory) -> bool {
        self.has_valid_consent_at(subject_id, purpose, Utc::now())
            .await
    }

    /// [`Self::has_valid_consent`] evaluated at an explicit instant.
    pub async fn has_valid_consent_at(
        &self,
        subject_id: &str,
        purpose: PurposeCategory,
        now: DateTime<Utc>,
    ) -> bool {
        let list = self.subject_list(subject_id).await;
        let records = list.lock().await;
        latest_grant(&records, purpose)
            .map(|granted_at| now - granted_at < Duration::days(VALIDITY_DAYS))
            .unwrap_or(false)
    }

    /// The full consent history for a subject, oldest first.
    pub async fn history(&self, subject_id: &str) -> Vec<ConsentRecord> {
        let list = self.subject_list(subject_id).await;
        let records = list.lock().await;
        records.clone()
    }

    /// Aggregate statistics over all subjects, evaluated at `now`.
    pub async fn stats_at(&self, now: DateTime<Utc>) -> LedgerStats {
        let mut stats = LedgerStats::default();
        let subjects: Vec<Arc<Mutex<Vec<ConsentRecord>>>> =
            self.subjects.read().await.values().cloned().collect();

        for list in subjects {
            let records = list.lock().await;
            stats.pending += records
                .iter()
                .filter(|r| r.status == ConsentStatus::Pending)
                .count();

            let mut processing_active = false;
            let mut sharing_active = false;
            for purpose in [
                PurposeCategory::DataProcessing,
                PurposeCategory::Analytics,
                PurposeCategory::Marketing,
                PurposeCategory::ThirdPartySharing,
            ] {
                let Some(granted_at) = latest_grant(&records, purpose) else {
                    continue;
                };
                let active = now - granted_at < Duration::days(VALIDITY_DAYS);
                if active {
                    stats.granted_active += 1;
                } else {
                    stats.granted_expired += 1;
                }
                match purpose {
                    PurposeCategory::DataProcessing => processing_active = active,
                    PurposeCategory::ThirdPartySharing => sharing_active = active,
                    _ => {}
                }
            }
            if sharing_active && !processing_active {
                stats.sharing_without_processing += 1;
            }
        }
        stats
    }

    /// Aggregate statistics evaluated now.
    pub async fn stats(&self) -> LedgerStats {
        self.stats_at(Utc::now()).await
    }

    async fn log_failure(&self, subject_id: &str, error: &TutelaError) {
        let _ = self
            .audit
            .append(AuditEntry::new(
                subject_id,
                AuditAction::OperationFailed,
                ResourceCategory::ConsentManagement,
                serde_json::json!({"error": error.to_string()}),
            ))
            .await;
    }
}

/// Response time of the most recent grant for the purpose, if any.
fn latest_grant(records: &[ConsentRecord], purpose: PurposeCategory) -> Option<DateTime<Utc>> {
    records
        .iter()
        .filter(|r| r.purpose == purpose && r.status == ConsentStatus::Granted)
        .filter_map(|r| r.responded_at)
        .max()
}
