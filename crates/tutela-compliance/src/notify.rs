use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use tutela_audit::{AuditAction, AuditEntry, ResourceCategory, SYSTEM_SUBJECT};
use tutela_core::{
    AuthorityNotifier, BreachSeverity, HttpTransport, TutelaError, TutelaResult,
};
use uuid::Uuid;

use crate::breach::BreachResponder;

/// Hours allowed before the national data-protection authority must be told.
const AUTHORITY_DEADLINE_HOURS: i64 = 72;

/// What happened, as handed to the notification workflow.
#[derive(Debug, Clone, Serialize)]
pub struct BreachDetails {
    /// Free-text description of the incident.
    pub description: String,
    /// Assessed severity.
    pub severity: BreachSeverity,
    /// Subject ids whose data may be affected.
    pub affected_subjects: Vec<String>,
    /// Containment actions already taken.
    pub containment_actions: Vec<String>,
}

/// A dispatched breach notification with its legal deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachNotification {
    /// Unique notification id.
    pub id: Uuid,
    /// Institution on whose behalf the notification was sent.
    pub institution_id: String,
    /// Severity that triggered the notification.
    pub severity: BreachSeverity,
    /// When the breach was detected.
    pub detected_at: DateTime<Utc>,
    /// Deadline for notifying the national authority. Always detection + 72h.
    pub authority_deadline: DateTime<Utc>,
    /// Deadline for informing affected subjects, when required.
    pub user_deadline: Option<DateTime<Utc>>,
    /// Authorities the notification was delivered to.
    pub authorities_notified: Vec<String>,
}

impl BreachResponder {
    /// Runs the notification workflow for a confirmed breach.
    ///
    /// The national authority and the institution's sector authority are
    /// always notified; affected subjects are notified for high and
    /// critical severities. A delivery failure aborts the workflow and is
    /// returned to the caller.
    pub async fn notify_breach(&self, details: &BreachDetails) -> TutelaResult<BreachNotification> {
        self.notify_breach_at(details, Utc::now()).await
    }

    /// Like [`notify_breach`](Self::notify_breach) with an explicit
    /// detection instant, so deadline arithmetic is checkable.
    pub async fn notify_breach_at(
        &self,
        details: &BreachDetails,
        detected_at: DateTime<Utc>,
    ) -> TutelaResult<BreachNotification> {
        let authority_deadline = detected_at + Duration::hours(AUTHORITY_DEADLINE_HOURS);
        let user_deadline = match details.severity {
            BreachSeverity::Critical => Some(detected_at + Duration::hours(24)),
            BreachSeverity::High => Some(detected_at + Duration::hours(72)),
            BreachSeverity::Medium | BreachSeverity::Low => None,
        };

        let mut authorities = vec!["ANPD".to_string()];
        if let Some(sector) = self.institution_type().sector_authority() {
            authorities.push(sector.to_string());
        }

        let notification = BreachNotification {
            id: Uuid::new_v4(),
            institution_id: self.institution_id().to_string(),
            severity: details.severity,
            detected_at,
            authority_deadline,
            user_deadline,
            authorities_notified: authorities.clone(),
        };

        let payload = serde_json::json!({
            "notification_id": notification.id,
            "institution_id": notification.institution_id,
            "severity": details.severity,
            "description": details.description,
            "detected_at": detected_at,
            "authority_deadline": authority_deadline,
            "affected_count": details.affected_subjects.len(),
            "containment_actions": details.containment_actions,
        });

        for authority in &authorities {
            self.notifier().notify_authority(authority, payload.clone()).await?;
            info!(
                authority = %authority,
                severity = %details.severity,
                "breach notification delivered"
            );
        }

        if details.severity >= BreachSeverity::High && !details.affected_subjects.is_empty() {
            self.notifier()
                .notify_subjects(&details.affected_subjects, payload.clone())
                .await?;
        }

        self.audit()
            .append(AuditEntry::new(
                SYSTEM_SUBJECT,
                AuditAction::BreachNotificationSent,
                ResourceCategory::Security,
                serde_json::json!({
                    "notification_id": notification.id,
                    "severity": details.severity,
                    "authorities": authorities,
                    "subjects_notified": details.severity >= BreachSeverity::High,
                    "authority_deadline": authority_deadline,
                    "user_deadline": user_deadline,
                }),
            ))
            .await?;

        Ok(notification)
    }
}

/// Delivers breach notifications over HTTP to per-authority endpoints.
pub struct HttpNotifier {
    transport: Arc<dyn HttpTransport>,
    endpoints: HashMap<String, String>,
    subject_endpoint: String,
    timeout: std::time::Duration,
}

impl HttpNotifier {
    /// Creates a notifier with an endpoint per authority name and one for
    /// subject notifications.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        endpoints: HashMap<String, String>,
        subject_endpoint: String,
    ) -> Self {
        Self {
            transport,
            endpoints,
            subject_endpoint,
            timeout: std::time::Duration::from_secs(10),
        }
    }
}

#[async_trait::async_trait]
impl AuthorityNotifier for HttpNotifier {
    async fn notify_authority(
        &self,
        authority: &str,
        payload: serde_json::Value,
    ) -> TutelaResult<()> {
        let endpoint = self.endpoints.get(authority).ok_or_else(|| {
            TutelaError::Validation(format!("no endpoint configured for authority '{authority}'"))
        })?;
        let response = self
            .transport
            .request("POST", endpoint, &[], Some(payload), self.timeout)
            .await?;
        if !response.is_success() {
            return Err(TutelaError::ServiceUnavailable(format!(
                "authority '{authority}' returned status {}",
                response.status
            )));
        }
        Ok(())
    }

    async fn notify_subjects(
        &self,
        subject_ids: &[String],
        payload: serde_json::Value,
    ) -> TutelaResult<()> {
        let body = serde_json::json!({
            "subjects": subject_ids,
            "notification": payload,
        });
        let response = self
            .transport
            .request("POST", &self.subject_endpoint, &[], Some(body), self.timeout)
            .await?;
        if !response.is_success() {
            return Err(TutelaError::ServiceUnavailable(format!(
                "subject notification endpoint returned status {}",
                response.status
            )));
        }
        Ok(())
    }
}
