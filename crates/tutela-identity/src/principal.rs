use crate::client::{EmployeeRecord, GovernmentValidator};
use serde::{Deserialize, Serialize};
use tutela_core::{TutelaError, TutelaResult};

/// Claims received from the identity provider after a login event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Stable subject identifier from the identity provider.
    pub subject_id: String,
    /// Email, when released by the provider.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, when released by the provider.
    #[serde(default)]
    pub name: Option<String>,
    /// Taxpayer id claim, when present.
    #[serde(default)]
    pub cpf: Option<String>,
    /// Federal employee registry id claim, when present.
    #[serde(default)]
    pub siape_id: Option<String>,
    /// Institution registry id claim, when present.
    #[serde(default)]
    pub institution_cnpj: Option<String>,
}

impl AuthClaims {
    fn government_fields(&self) -> Option<(&str, &str, &str)> {
        match (&self.siape_id, &self.cpf, &self.institution_cnpj) {
            (Some(siape), Some(cpf), Some(cnpj)) => Some((siape, cpf, cnpj)),
            _ => None,
        }
    }
}

/// The augmented principal handed back to the login flow.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedPrincipal {
    /// The original identity-provider claims.
    pub claims: AuthClaims,
    /// Whether the government registry confirmed the employee identity.
    pub government_validated: bool,
    /// Employee record, when validation succeeded.
    pub employee: Option<EmployeeRecord>,
    /// Error signal when validation was attempted and did not confirm.
    pub error: Option<String>,
}

impl GovernmentValidator {
    /// Enriches identity-provider claims with government validation.
    ///
    /// When the claims carry no government identifiers, no validation is
    /// required and the principal comes back unvalidated with no error.
    /// Malformed identifier claims and registry unavailability surface as
    /// an error signal on the principal; they never fail the login flow.
    pub async fn validate_principal(&self, claims: AuthClaims) -> TutelaResult<ValidatedPrincipal> {
        let Some((siape_id, cpf, cnpj)) = claims.government_fields() else {
            return Ok(ValidatedPrincipal {
                claims,
                government_validated: false,
                employee: None,
                error: None,
            });
        };

        match self.validate_employee(siape_id, cpf, cnpj).await {
            Ok(outcome) => Ok(ValidatedPrincipal {
                government_validated: outcome.valid,
                employee: outcome.data,
                error: outcome.error,
                claims,
            }),
            Err(TutelaError::Validation(reason)) => Ok(ValidatedPrincipal {
                claims,
                government_validated: false,
                employee: None,
                error: Some(reason),
            }),
            Err(e) => Err(e),
        }
    }
}
