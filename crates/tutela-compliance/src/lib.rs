//! LGPD compliance modules: consent lifecycle, right to erasure, breach
//! response, and compliance assessment.
//!
//! Every operation in this crate writes its evidence through the
//! [`tutela_audit::AuditTrail`] before reporting success; the trail is the
//! ground truth the [`ComplianceReporter`] and external auditors read.
//!
//! # Main types
//!
//! - [`ConsentLedger`] — Consent request/response lifecycle per subject.
//! - [`ErasurePlanner`] — Right-to-erasure partitioning and execution.
//! - [`BreachResponder`] — Anomaly scoring and breach notification.
//! - [`ComplianceReporter`] — Scored assessment across LGPD principles.

/// Breach detection and severity scoring.
pub mod breach;
/// Consent lifecycle ledger.
pub mod consent;
/// Right-to-erasure planning and execution.
pub mod erasure;
/// Breach notification workflow and delivery.
pub mod notify;
/// Compliance assessment reporting.
pub mod report;

pub use breach::{BreachAssessment, BreachResponder, BreachSignals};
pub use consent::{ConsentLedger, ConsentRecord, ConsentStatus, LedgerStats};
pub use erasure::{DataMinimizer, ErasureOutcome, ErasurePlanner};
pub use notify::{BreachDetails, BreachNotification, HttpNotifier};
pub use report::{
    ComplianceAssessment, ComplianceIssue, ComplianceReporter, IssueSeverity, Principle,
    SectionAssessment,
};
