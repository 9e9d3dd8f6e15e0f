use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use tutela_audit::{AuditAction, AuditEntry, AuditTrail, ResourceCategory, SYSTEM_SUBJECT};
use tutela_core::{AuthorityNotifier, BreachSeverity, InstitutionType, TutelaResult};

use crate::notify::{BreachDetails, BreachNotification};

/// Observed anomaly signals feeding the breach score.
///
/// Each signal carries a fixed weight; the weights are additive so that any
/// combination maps to exactly one score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BreachSignals {
    /// Access from unusual locations or at unusual hours.
    pub unusual_access: bool,
    /// Suspicious account activity (weight 2).
    pub suspicious_activity: bool,
    /// Evidence of data leaving the platform (weight 4).
    pub data_exfiltration: bool,
    /// Evidence of system-level compromise (weight 8).
    pub system_compromise: bool,
}

impl BreachSignals {
    /// Additive anomaly score: 1 + 2 + 4 + 8 per raised signal.
    pub fn score(self) -> u8 {
        let mut score = 0;
        if self.unusual_access {
            score += 1;
        }
        if self.suspicious_activity {
            score += 2;
        }
        if self.data_exfiltration {
            score += 4;
        }
        if self.system_compromise {
            score += 8;
        }
        score
    }

    /// Maps the score onto a severity: >=8 critical, >=4 high, >=2 medium.
    pub fn severity(self) -> BreachSeverity {
        match self.score() {
            s if s >= 8 => BreachSeverity::Critical,
            s if s >= 4 => BreachSeverity::High,
            s if s >= 2 => BreachSeverity::Medium,
            _ => BreachSeverity::Low,
        }
    }
}

/// Fixed response playbook for a given severity.
pub fn recommended_actions(severity: BreachSeverity) -> Vec<String> {
    let actions: &[&str] = match severity {
        BreachSeverity::Critical => &[
            "isolate affected systems",
            "notify ANPD within 72 hours",
            "inform affected subjects immediately",
            "activate incident response plan",
            "preserve forensic evidence",
        ],
        BreachSeverity::High => &[
            "assess scope of exposure",
            "prepare authority notification",
            "plan subject communications",
            "review access controls",
        ],
        BreachSeverity::Medium => &[
            "increase monitoring",
            "review access logs",
            "update security procedures",
        ],
        BreachSeverity::Low => &[],
    };
    actions.iter().map(|a| (*a).to_string()).collect()
}

/// Result of a breach detection run.
#[derive(Debug, Clone, Serialize)]
pub struct BreachAssessment {
    /// Whether the signals crossed the reporting threshold.
    pub breach_detected: bool,
    /// Assessed severity.
    pub severity: BreachSeverity,
    /// Subject ids potentially affected.
    pub affected_subjects: Vec<String>,
    /// Playbook actions for this severity.
    pub recommended_actions: Vec<String>,
    /// Dispatched notification, present only when the workflow auto-ran.
    pub notification: Option<BreachNotification>,
}

/// Scores anomaly signals and drives the breach response for one
/// institution.
pub struct BreachResponder {
    institution_id: String,
    institution_type: InstitutionType,
    audit: Arc<dyn AuditTrail>,
    notifier: Arc<dyn AuthorityNotifier>,
}

impl BreachResponder {
    /// Creates a responder for the given institution.
    pub fn new(
        institution_id: impl Into<String>,
        institution_type: InstitutionType,
        audit: Arc<dyn AuditTrail>,
        notifier: Arc<dyn AuthorityNotifier>,
    ) -> Self {
        Self {
            institution_id: institution_id.into(),
            institution_type,
            audit,
            notifier,
        }
    }

    pub(crate) fn institution_id(&self) -> &str {
        &self.institution_id
    }

    pub(crate) fn institution_type(&self) -> InstitutionType {
        self.institution_type
    }

    pub(crate) fn audit(&self) -> &Arc<dyn AuditTrail> {
        &self.audit
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn AuthorityNotifier> {
        &self.notifier
    }

    /// Scores the signals and, when a breach is detected, records it and —
    /// for critical severity — immediately runs the notification workflow.
    ///
    /// A low score is not a breach: nothing is written to the trail.
    pub async fn detect_breach(
        &self,
        signals: BreachSignals,
        description: &str,
    ) -> TutelaResult<BreachAssessment> {
        let severity = signals.severity();
        if severity == BreachSeverity::Low {
            return Ok(BreachAssessment {
                breach_detected: false,
                severity,
                affected_subjects: Vec::new(),
                recommended_actions: recommended_actions(severity),
                notification: None,
            });
        }

        let affected_subjects = self.affected_subjects().await?;
        warn!(
            severity = %severity,
            score = signals.score(),
            affected = affected_subjects.len(),
            "data breach detected"
        );

        self.audit
            .append(AuditEntry::new(
                SYSTEM_SUBJECT,
                AuditAction::BreachDetected,
                ResourceCategory::Security,
                serde_json::json!({
                    "score": signals.score(),
                    "severity": severity,
                    "description": description,
                    "affected_count": affected_subjects.len(),
                }),
            ))
            .await?;

        let actions = recommended_actions(severity);
        let notification = if severity == BreachSeverity::Critical {
            let details = BreachDetails {
                description: description.to_string(),
                severity,
                affected_subjects: affected_subjects.clone(),
                containment_actions: actions.clone(),
            };
            Some(self.notify_breach(&details).await?)
        } else {
            None
        };

        Ok(BreachAssessment {
            breach_detected: true,
            severity,
            affected_subjects,
            recommended_actions: actions,
            notification,
        })
    }

    /// Every distinct subject the trail has evidence about. Conservative:
    /// without finer-grained scoping, all known subjects are treated as
    /// potentially affected.
    async fn affected_subjects(&self) -> TutelaResult<Vec<String>> {
        let entries = self.audit.entries().await?;
        let mut subjects: Vec<String> = Vec::new();
        for entry in entries {
            if entry.subject_id != SYSTEM_SUBJECT && !subjects.contains(&entry.subject_id) {
                subjects.push(entry.subject_id);
            }
        }
        Ok(subjects)
    }
}
