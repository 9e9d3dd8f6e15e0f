//! Append-only audit trail for compliance evidence.
//!
//! Every compliance-relevant operation in Tutela writes through this trail,
//! and the write must be durable before the triggering operation reports
//! success. Entries are never mutated or deleted by the core; the trail is
//! the ground truth external audit tools read.
//!
//! # Main types
//!
//! - [`AuditEntry`] — A single immutable audit record.
//! - [`AuditTrail`] — The durable append + snapshot-read capability.
//! - [`JsonlAuditTrail`] — File-backed trail (one JSON object per line).
//! - [`MemoryAuditTrail`] — In-memory trail for tests and embedding.

/// JSONL file-backed audit trail.
pub mod jsonl;
/// In-memory audit trail.
pub mod memory;

pub use jsonl::JsonlAuditTrail;
pub use memory::MemoryAuditTrail;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tutela_core::TutelaResult;
use uuid::Uuid;

/// Subject id used for entries not attributable to an individual.
pub const SYSTEM_SUBJECT: &str = "system";

/// The compliance-relevant action an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A consent request was created for a subject.
    ConsentRequested,
    /// A subject responded to a pending consent request.
    ConsentResponded,
    /// Data was minimized after a consent denial.
    DataMinimized,
    /// An erasure request was executed.
    DataErased,
    /// A breach was detected from anomaly signals.
    BreachDetected,
    /// A breach notification was delivered.
    BreachNotificationSent,
    /// An employee identity was checked against the government registry.
    EmployeeValidated,
    /// An institution was checked against the government registry.
    InstitutionValidated,
    /// A compliance assessment report was generated.
    ReportGenerated,
    /// A compliance operation failed; recorded best-effort.
    OperationFailed,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuditAction::ConsentRequested => "consent_requested",
            AuditAction::ConsentResponded => "consent_responded",
            AuditAction::DataMinimized => "data_minimized",
            AuditAction::DataErased => "data_erased",
            AuditAction::BreachDetected => "breach_detected",
            AuditAction::BreachNotificationSent => "breach_notification_sent",
            AuditAction::EmployeeValidated => "employee_validated",
            AuditAction::InstitutionValidated => "institution_validated",
            AuditAction::ReportGenerated => "report_generated",
            AuditAction::OperationFailed => "operation_failed",
        };
        write!(f, "{name}")
    }
}

/// The resource surface an audited action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    /// Consent ledger operations.
    ConsentManagement,
    /// Erasure and minimization operations.
    PrivacyRights,
    /// Breach detection and response.
    Security,
    /// Government registry lookups.
    GovernmentIntegration,
    /// Compliance report generation.
    ComplianceReporting,
}

/// A single immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry id.
    pub id: Uuid,
    /// The subject concerned, or [`SYSTEM_SUBJECT`].
    pub subject_id: String,
    /// What happened.
    pub action: AuditAction,
    /// Which resource surface it happened on.
    pub resource: ResourceCategory,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Source IP of the triggering request, or "system".
    pub source_ip: String,
    /// User agent of the triggering request, or "system".
    pub user_agent: String,
    /// Structured action-specific detail.
    pub detail: serde_json::Value,
}

impl AuditEntry {
    /// Creates an entry timestamped now, attributed to the system.
    pub fn new(
        subject_id: impl Into<String>,
        action: AuditAction,
        resource: ResourceCategory,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            action,
            resource,
            timestamp: Utc::now(),
            source_ip: SYSTEM_SUBJECT.to_string(),
            user_agent: SYSTEM_SUBJECT.to_string(),
            detail,
        }
    }

    /// Attributes the entry to a client request.
    pub fn with_source(mut self, source_ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.source_ip = source_ip.into();
        self.user_agent = user_agent.into();
        self
    }
}

/// Durable append-only sink shared by every Tutela component.
///
/// `append` must only return `Ok` once the entry is durable; callers treat
/// an append failure as fatal to the operation being audited.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Durably append one entry.
    async fn append(&self, entry: AuditEntry) -> TutelaResult<()>;

    /// Snapshot of all entries in append order.
    async fn entries(&self) -> TutelaResult<Vec<AuditEntry>>;

    /// Snapshot of the entries for one subject, in append order.
    async fn entries_for_subject(&self, subject_id: &str) -> TutelaResult<Vec<AuditEntry>> {
        let entries = self.entries().await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.subject_id == subject_id)
            .collect())
    }
}
