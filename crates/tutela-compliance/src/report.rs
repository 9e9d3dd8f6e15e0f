use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use tutela_audit::{AuditAction, AuditEntry, AuditTrail, ResourceCategory, SYSTEM_SUBJECT};
use tutela_core::{BreachSeverity, PrivacyControls, TutelaResult};

use crate::consent::{ConsentLedger, LedgerStats};

/// Score below which a section is flagged as non-compliant.
const COMPLIANT_THRESHOLD: u32 = 70;

/// LGPD principles a report section is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principle {
    /// Processing rests on a recorded legal basis.
    Lawfulness,
    /// Denied consent leads to actual data minimization.
    Fairness,
    /// Operations leave a readable evidence trail.
    Transparency,
    /// Data is not shared beyond the consented purpose.
    PurposeLimitation,
    /// Erasure requests execute fully.
    DataMinimization,
    /// Identity claims are verified against authoritative registries.
    Accuracy,
    /// Expired consent is not treated as live.
    StorageLimitation,
    /// Breaches are detected and notified within deadlines.
    Security,
}

impl std::fmt::Display for Principle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Principle::Lawfulness => "lawfulness",
            Principle::Fairness => "fairness",
            Principle::Transparency => "transparency",
            Principle::PurposeLimitation => "purpose_limitation",
            Principle::DataMinimization => "data_minimization",
            Principle::Accuracy => "accuracy",
            Principle::StorageLimitation => "storage_limitation",
            Principle::Security => "security",
        };
        write!(f, "{name}")
    }
}

/// How urgent a flagged issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Should be addressed in the next review cycle.
    Advisory,
    /// Requires remediation.
    Material,
}

/// A concrete finding attached to a non-compliant section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceIssue {
    /// Principle the issue falls under.
    pub section: Principle,
    /// What was found.
    pub description: String,
    /// How urgent it is.
    pub severity: IssueSeverity,
    /// Suggested remediation.
    pub recommendation: String,
}

/// Scored assessment of one principle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionAssessment {
    /// Principle assessed.
    pub principle: Principle,
    /// Score from 0 to 100.
    pub score: u32,
    /// Whether the section meets the compliance threshold.
    pub compliant: bool,
    /// Findings, present only when non-compliant.
    pub issues: Vec<ComplianceIssue>,
}

/// A full compliance assessment for one institution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceAssessment {
    /// Institution the report covers.
    pub institution_id: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Per-principle sections.
    pub sections: Vec<SectionAssessment>,
    /// Mean of the section scores.
    pub overall_score: f64,
    /// True when every section is compliant.
    pub is_compliant: bool,
    /// The privacy controls in force when the report was generated.
    pub controls: PrivacyControls,
}

/// Counters derived from the evidence trail.
///
/// Entries written by earlier report generations are excluded, so scoring
/// the same state twice yields the same sections.
#[derive(Debug, Default)]
struct AuditStats {
    total: usize,
    denied_responses: usize,
    minimizations: usize,
    erasure_failures: usize,
    failed_validations: usize,
    breaches_high_critical: usize,
    breaches_medium: usize,
    notifications_sent: usize,
}

impl AuditStats {
    fn from_entries(entries: &[AuditEntry]) -> Self {
        let mut stats = AuditStats::default();
        for entry in entries {
            if entry.action == AuditAction::ReportGenerated {
                continue;
            }
            stats.total += 1;
            match entry.action {
                AuditAction::ConsentResponded => {
                    if entry.detail["granted"] == false {
                        stats.denied_responses += 1;
                    }
                }
                AuditAction::DataMinimized => stats.minimizations += 1,
                AuditAction::DataErased => {
                    // A partial entry means deletion stopped mid-execution.
                    if entry.detail["partial"] == true {
                        stats.erasure_failures += 1;
                    }
                }
                AuditAction::EmployeeValidated | AuditAction::InstitutionValidated => {
                    let degraded = entry.detail["error"] == "service unavailable";
                    if entry.detail["valid"] == false && !degraded {
                        stats.failed_validations += 1;
                    }
                }
                AuditAction::BreachDetected => {
                    match serde_json::from_value::<BreachSeverity>(entry.detail["severity"].clone())
                    {
                        Ok(BreachSeverity::High | BreachSeverity::Critical) => {
                            stats.breaches_high_critical += 1;
                        }
                        Ok(BreachSeverity::Medium) => stats.breaches_medium += 1,
                        _ => {}
                    }
                }
                AuditAction::BreachNotificationSent => stats.notifications_sent += 1,
                _ => {}
            }
        }
        stats
    }
}

/// Generates scored compliance assessments from the evidence trail and the
/// consent ledger.
pub struct ComplianceReporter {
    institution_id: String,
    audit: Arc<dyn AuditTrail>,
    ledger: Arc<ConsentLedger>,
    controls: PrivacyControls,
}

impl ComplianceReporter {
    /// Creates a reporter for the given institution.
    pub fn new(
        institution_id: impl Into<String>,
        audit: Arc<dyn AuditTrail>,
        ledger: Arc<ConsentLedger>,
        controls: PrivacyControls,
    ) -> Self {
        Self {
            institution_id: institution_id.into(),
            audit,
            ledger,
            controls,
        }
    }

    /// Scores all eight principles against the current trail and ledger.
    ///
    /// Deterministic for a fixed underlying state: earlier report entries
    /// in the trail do not influence the scores.
    pub async fn generate_assessment(&self) -> TutelaResult<ComplianceAssessment> {
        let entries = self.audit.entries().await?;
        let stats = AuditStats::from_entries(&entries);
        let ledger_stats = self.ledger.stats().await;

        let sections = vec![
            score_lawfulness(&ledger_stats),
            score_fairness(&stats),
            score_transparency(&stats),
            score_purpose_limitation(&ledger_stats),
            score_data_minimization(&stats),
            score_accuracy(&stats),
            score_storage_limitation(&ledger_stats),
            score_security(&stats),
        ];

        #[allow(clippy::cast_precision_loss)]
        let overall_score =
            sections.iter().map(|s| f64::from(s.score)).sum::<f64>() / sections.len() as f64;
        let is_compliant = sections.iter().all(|s| s.compliant);

        let assessment = ComplianceAssessment {
            institution_id: self.institution_id.clone(),
            generated_at: Utc::now(),
            sections,
            overall_score,
            is_compliant,
            controls: self.controls.clone(),
        };

        self.audit
            .append(AuditEntry::new(
                SYSTEM_SUBJECT,
                AuditAction::ReportGenerated,
                ResourceCategory::ComplianceReporting,
                serde_json::json!({
                    "institution_id": assessment.institution_id,
                    "overall_score": assessment.overall_score,
                    "is_compliant": assessment.is_compliant,
                }),
            ))
            .await?;
        info!(
            institution_id = %assessment.institution_id,
            overall_score = assessment.overall_score,
            is_compliant = assessment.is_compliant,
            "compliance assessment generated"
        );

        Ok(assessment)
    }
}

fn section(principle: Principle, score: u32, issues: Vec<ComplianceIssue>) -> SectionAssessment {
    let compliant = score >= COMPLIANT_THRESHOLD;
    SectionAssessment {
        principle,
        score,
        compliant,
        issues: if compliant { Vec::new() } else { issues },
    }
}

fn score_lawfulness(ledger: &LedgerStats) -> SectionAssessment {
    let deduction = u32::try_from(ledger.pending).unwrap_or(u32::MAX).saturating_mul(5);
    let score = 100u32.saturating_sub(deduction).max(60);
    section(
        Principle::Lawfulness,
        score,
        vec![ComplianceIssue {
            section: Principle::Lawfulness,
            description: format!(
                "{} consent requests are still awaiting a response",
                ledger.pending
            ),
            severity: IssueSeverity::Advisory,
            recommendation: "chase outstanding consent requests or withdraw them".to_string(),
        }],
    )
}

fn score_fairness(stats: &AuditStats) -> SectionAssessment {
    let unminimized = stats.denied_responses.saturating_sub(stats.minimizations);
    let deduction = u32::try_from(unminimized).unwrap_or(u32::MAX).saturating_mul(20);
    let score = 100u32.saturating_sub(deduction);
    section(
        Principle::Fairness,
        score,
        vec![ComplianceIssue {
            section: Principle::Fairness,
            description: format!(
                "{unminimized} consent denials have no matching data minimization"
            ),
            severity: IssueSeverity::Material,
            recommendation: "run minimization for every denied purpose".to_string(),
        }],
    )
}

fn score_transparency(stats: &AuditStats) -> SectionAssessment {
    let score = if stats.total > 0 { 100 } else { 50 };
    section(
        Principle::Transparency,
        score,
        vec![ComplianceIssue {
            section: Principle::Transparency,
            description: "no operations have left evidence in the audit trail".to_string(),
            severity: IssueSeverity::Material,
            recommendation: "verify the audit trail is wired into all operations".to_string(),
        }],
    )
}

fn score_purpose_limitation(ledger: &LedgerStats) -> SectionAssessment {
    let deduction = u32::try_from(ledger.sharing_without_processing)
        .unwrap_or(u32::MAX)
        .saturating_mul(15);
    let score = 100u32.saturating_sub(deduction);
    section(
        Principle::PurposeLimitation,
        score,
        vec![ComplianceIssue {
            section: Principle::PurposeLimitation,
            description: format!(
                "{} subjects have third-party sharing consent without data-processing consent",
                ledger.sharing_without_processing
            ),
            severity: IssueSeverity::Material,
            recommendation: "re-request data-processing consent before sharing".to_string(),
        }],
    )
}

fn score_data_minimization(stats: &AuditStats) -> SectionAssessment {
    let deduction = u32::try_from(stats.erasure_failures)
        .unwrap_or(u32::MAX)
        .saturating_mul(25);
    let score = 100u32.saturating_sub(deduction);
    section(
        Principle::DataMinimization,
        score,
        vec![ComplianceIssue {
            section: Principle::DataMinimization,
            description: format!(
                "{} erasure requests stopped before deleting everything",
                stats.erasure_failures
            ),
            severity: IssueSeverity::Material,
            recommendation: "investigate and re-run the failed erasure requests".to_string(),
        }],
    )
}

fn score_accuracy(stats: &AuditStats) -> SectionAssessment {
    let deduction = u32::try_from(stats.failed_validations)
        .unwrap_or(u32::MAX)
        .saturating_mul(10);
    let score = 100u32.saturating_sub(deduction);
    section(
        Principle::Accuracy,
        score,
        vec![ComplianceIssue {
            section: Principle::Accuracy,
            description: format!(
                "{} identity claims were rejected by government registries",
                stats.failed_validations
            ),
            severity: IssueSeverity::Advisory,
            recommendation: "review rejected claims with the affected subjects".to_string(),
        }],
    )
}

fn score_storage_limitation(ledger: &LedgerStats) -> SectionAssessment {
    let deduction = u32::try_from(ledger.granted_expired)
        .unwrap_or(u32::MAX)
        .saturating_mul(15);
    let score = 100u32.saturating_sub(deduction);
    section(
        Principle::StorageLimitation,
        score,
        vec![ComplianceIssue {
            section: Principle::StorageLimitation,
            description: format!(
                "{} grants are past the two-year validity window",
                ledger.granted_expired
            ),
            severity: IssueSeverity::Material,
            recommendation: "re-request consent for the expired grants".to_string(),
        }],
    )
}

fn score_security(stats: &AuditStats) -> SectionAssessment {
    let unnotified = stats
        .breaches_high_critical
        .saturating_sub(stats.notifications_sent);
    let mut score = 100u32.saturating_sub(
        u32::try_from(unnotified).unwrap_or(u32::MAX).saturating_mul(30),
    );
    // Medium breaches cost points but never push the section below 70 on
    // their own.
    let medium_deduction = u32::try_from(stats.breaches_medium)
        .unwrap_or(u32::MAX)
        .saturating_mul(10);
    score = score.saturating_sub(medium_deduction).max(score.min(70));
    section(
        Principle::Security,
        score,
        vec![ComplianceIssue {
            section: Principle::Security,
            description: format!(
                "{unnotified} high or critical breaches have no dispatched notification"
            ),
            severity: IssueSeverity::Material,
            recommendation: "run the notification workflow before the 72-hour deadline"
                .to_string(),
        }],
    )
}
