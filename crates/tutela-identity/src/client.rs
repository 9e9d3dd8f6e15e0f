use crate::cnpj::is_valid_cnpj;
use crate::config::RegistryConfig;
use crate::cpf::is_valid_cpf;
use crate::hash::hash_identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tutela_audit::{AuditAction, AuditEntry, AuditTrail, ResourceCategory};
use tutela_core::{HttpTransport, InstitutionType, TutelaError, TutelaResult};

/// Uniform result shape for registry lookups.
///
/// `valid=false` with `error = "service unavailable"` means the registry
/// could not answer; it must never be read as "invalid" or "denied".
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome<T> {
    /// Whether the registry confirmed the identity.
    pub valid: bool,
    /// Registry payload when the identity was confirmed.
    pub data: Option<T>,
    /// Reason the identity was not confirmed, when it wasn't.
    pub error: Option<String>,
}

impl<T> ValidationOutcome<T> {
    fn found(data: T) -> Self {
        Self {
            valid: true,
            data: Some(data),
            error: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            data: None,
            error: Some(reason.into()),
        }
    }

    fn unavailable() -> Self {
        Self::rejected("service unavailable")
    }

    /// Whether the lookup failed because the registry was unreachable.
    pub fn is_unavailable(&self) -> bool {
        self.error.as_deref() == Some("service unavailable")
    }
}

/// Employee record confirmed by the SIAPE registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    /// Full name on record.
    pub name: String,
    /// Current position.
    pub position: String,
    /// Employing institution name.
    pub institution: String,
    /// Whether the employment is active.
    pub active: bool,
    /// Date of admission into public service.
    pub admission_date: DateTime<Utc>,
}

/// Institution record confirmed by the Sintegra registry.
#[derive(Debug, Clone, Serialize)]
pub struct InstitutionRecord {
    /// Registered institution name.
    pub name: String,
    /// Institution type, strictly parsed from the registry code.
    pub institution_type: InstitutionType,
    /// Registration status reported by the registry.
    pub status: String,
    /// Date of registration.
    pub registration_date: DateTime<Utc>,
    /// Registered address.
    pub address: InstitutionAddress,
}

/// Registered address of an institution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionAddress {
    /// Street and number.
    pub street: String,
    /// City.
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
}

/// Reachability of the two registries, as reported by their health routes.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegistryConnectivity {
    /// Whether the SIAPE health route answered 2xx.
    pub siape: bool,
    /// Whether the Sintegra health route answered 2xx.
    pub sintegra: bool,
}

#[derive(Deserialize)]
struct SiapeResponse {
    success: bool,
    employee: Option<EmployeeRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SintegraInstitution {
    name: String,
    #[serde(rename = "type")]
    type_code: String,
    status: String,
    registration_date: DateTime<Utc>,
    address: InstitutionAddress,
}

#[derive(Deserialize)]
struct SintegraResponse {
    success: bool,
    institution: Option<SintegraInstitution>,
}

/// Orchestrates employee and institution identity checks against the
/// government registries.
///
/// Every lookup is guarded by the local checksum validators first: a
/// malformed identifier is a [`TutelaError::Validation`] and no network call
/// is made. The CPF is never transmitted raw; only its SHA-256 digest
/// crosses the wire.
pub struct GovernmentValidator {
    config: RegistryConfig,
    transport: Arc<dyn HttpTransport>,
    audit: Arc<dyn AuditTrail>,
}

impl GovernmentValidator {
    /// Creates a validator over the given transport and audit trail.
    pub fn new(
        config: RegistryConfig,
        transport: Arc<dyn HttpTransport>,
        audit: Arc<dyn AuditTrail>,
    ) -> Self {
        Self {
            config,
            transport,
            audit,
        }
    }

    /// Validates an employee against the SIAPE registry.
    ///
    /// Outcomes: confirmed (`valid=true` with the employee record), not
    /// found or inactive, or service unavailable. Registry outages degrade;
    /// they never propagate as errors.
    pub async fn validate_employee(
        &self,
        siape_id: &str,
        cpf: &str,
        institution_cnpj: &str,
    ) -> TutelaResult<ValidationOutcome<EmployeeRecord>> {
        if !is_valid_cpf(cpf) {
            let err = TutelaError::Validation("malformed taxpayer identifier".to_string());
            self.log_failure(siape_id, &err).await;
            return Err(err);
        }
        if !is_valid_cnpj(institution_cnpj) {
            let err =
                TutelaError::Validation("malformed institution registry identifier".to_string());
            self.log_failure(siape_id, &err).await;
            return Err(err);
        }

        let cpf_hash = hash_identifier(&digits_only(cpf));
        let payload = serde_json::json!({
            "siapeId": siape_id,
            "cpfHash": cpf_hash,
            "institutionCnpj": digits_only(institution_cnpj),
        });
        let url = format!("{}/validate-employee", self.config.siape_endpoint);

        let response = match self
            .transport
            .request(
                "POST",
                &url,
                &self.headers(self.config.siape_api_key.as_deref()),
                Some(payload),
                self.config.timeout(),
            )
            .await
        {
            Ok(response) => response,
            Err(TutelaError::ServiceUnavailable(reason)) => {
                warn!(%reason, "SIAPE registry unreachable");
                return self
                    .degraded(siape_id, AuditAction::EmployeeValidated, &cpf_hash)
                    .await;
            }
            Err(e) => return Err(e),
        };

        if !response.is_success() {
            warn!(status = response.status, "SIAPE registry error response");
            return self
                .degraded(siape_id, AuditAction::EmployeeValidated, &cpf_hash)
                .await;
        }

        let parsed: SiapeResponse = match serde_json::from_str(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "unparseable SIAPE response");
                return self
                    .degraded(siape_id, AuditAction::EmployeeValidated, &cpf_hash)
                    .await;
            }
        };

        let outcome = match (parsed.success, parsed.employee) {
            (true, Some(employee)) => ValidationOutcome::found(employee),
            _ => ValidationOutcome::rejected("employee not found or inactive"),
        };

        self.audit
            .append(AuditEntry::new(
                siape_id,
                AuditAction::EmployeeValidated,
                ResourceCategory::GovernmentIntegration,
                serde_json::json!({
                    "valid": outcome.valid,
                    "cpf_hash": cpf_hash,
                    "error": outcome.error,
                }),
            ))
            .await?;
        Ok(outcome)
    }

    /// Validates an institution against the Sintegra registry.
    pub async fn validate_institution(
        &self,
        cnpj: &str,
    ) -> TutelaResult<ValidationOutcome<InstitutionRecord>> {
        if !is_valid_cnpj(cnpj) {
            let err =
                TutelaError::Validation("malformed institution registry identifier".to_string());
            self.log_failure(&digits_only(cnpj), &err).await;
            return Err(err);
        }

        let cnpj = digits_only(cnpj);
        let url = format!("{}/institution/{cnpj}", self.config.sintegra_endpoint);

        let response = match self
            .transport
            .request(
                "GET",
                &url,
                &self.headers(self.config.sintegra_api_key.as_deref()),
                None,
                self.config.timeout(),
            )
            .await
        {
            Ok(response) => response,
            Err(TutelaError::ServiceUnavailable(reason)) => {
                warn!(%reason, "Sintegra registry unreachable");
                return self
                    .degraded(&cnpj, AuditAction::InstitutionValidated, &cnpj)
                    .await;
            }
            Err(e) => return Err(e),
        };

        if !response.is_success() {
            warn!(status = response.status, "Sintegra registry error response");
            return self
                .degraded(&cnpj, AuditAction::InstitutionValidated, &cnpj)
                .await;
        }

        let parsed: SintegraResponse = match serde_json::from_str(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "unparseable Sintegra response");
                return self
                    .degraded(&cnpj, AuditAction::InstitutionValidated, &cnpj)
                    .await;
            }
        };

        let outcome = match (parsed.success, parsed.institution) {
            (true, Some(raw)) => {
                // Unknown type codes are rejected, not defaulted.
                let institution_type = match InstitutionType::from_registry_code(&raw.type_code) {
                    Ok(t) => t,
                    Err(e) => {
                        self.log_failure(&cnpj, &e).await;
                        return Err(e);
                    }
                };
                ValidationOutcome::found(InstitutionRecord {
                    name: raw.name,
                    institution_type,
                    status: raw.status,
                    registration_date: raw.registration_date,
                    address: raw.address,
                })
            }
            _ => ValidationOutcome::rejected("institution not found"),
        };

        self.audit
            .append(AuditEntry::new(
                cnpj.as_str(),
                AuditAction::InstitutionValidated,
                ResourceCategory::GovernmentIntegration,
                serde_json::json!({
                    "valid": outcome.valid,
                    "error": outcome.error,
                }),
            ))
            .await?;
        Ok(outcome)
    }

    /// Probes the health routes of both registries. Failures degrade to
    /// `false`; this never errors.
    pub async fn check_connectivity(&self) -> RegistryConnectivity {
        let timeout = Duration::from_secs(5);
        let siape = self
            .probe(&format!("{}/health", self.config.siape_endpoint), timeout)
            .await;
        let sintegra = self
            .probe(
                &format!("{}/health", self.config.sintegra_endpoint),
                timeout,
            )
            .await;
        RegistryConnectivity { siape, sintegra }
    }

    async fn probe(&self, url: &str, timeout: Duration) -> bool {
        match self.transport.request("GET", url, &[], None, timeout).await {
            Ok(response) => response.is_success(),
            Err(_) => false,
        }
    }

    fn headers(&self, api_key: Option<&str>) -> Vec<(String, String)> {
        let mut headers = vec![("X-API-Version".to_string(), "2.0".to_string())];
        if let Some(key) = api_key {
            headers.push(("Authorization".to_string(), format!("Bearer {key}")));
        }
        headers
    }

    /// Audits a degraded lookup and returns the unavailable outcome.
    async fn degraded<T>(
        &self,
        subject_id: &str,
        action: AuditAction,
        reference: &str,
    ) -> TutelaResult<ValidationOutcome<T>> {
        self.audit
            .append(AuditEntry::new(
                subject_id,
                action,
                ResourceCategory::GovernmentIntegration,
                serde_json::json!({
                    "valid": false,
                    "error": "service unavailable",
                    "reference": reference,
                }),
            ))
            .await?;
        Ok(ValidationOutcome::unavailable())
    }

    /// Best-effort failure record; the primary error is already on its way
    /// to the caller.
    async fn log_failure(&self, subject_id: &str, error: &TutelaError) {
        let _ = self
            .audit
            .append(AuditEntry::new(
                subject_id,
                AuditAction::OperationFailed,
                ResourceCategory::GovernmentIntegration,
                serde_json::json!({"error": error.to_string()}),
            ))
            .await;
    }
}

fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}
