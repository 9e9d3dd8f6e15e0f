#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the government registry client.
//!
//! Covers the checksum guard, hashed identifier transmission, the uniform
//! outcome shape, degradation on registry outage, strict institution-type
//! parsing, connectivity probing, and principal enrichment.

use std::sync::Arc;
use tutela_audit::{AuditAction, AuditTrail, MemoryAuditTrail};
use tutela_core::{InstitutionType, ReqwestTransport, TutelaError};
use tutela_identity::{hash_identifier, AuthClaims, GovernmentValidator, RegistryConfig};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALID_CPF: &str = "52998224725";
const VALID_CNPJ: &str = "11222333000181";

fn validator_for(
    siape: &str,
    sintegra: &str,
) -> (GovernmentValidator, Arc<MemoryAuditTrail>) {
    let config = RegistryConfig {
        siape_endpoint: siape.to_string(),
        sintegra_endpoint: sintegra.to_string(),
        siape_api_key: Some("test-key".to_string()),
        sintegra_api_key: Some("test-key".to_string()),
        timeout_secs: 2,
    };
    let audit = Arc::new(MemoryAuditTrail::new());
    let transport = Arc::new(ReqwestTransport::new().unwrap());
    (
        GovernmentValidator::new(config, transport, audit.clone()),
        audit,
    )
}

fn employee_body() -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "employee": {
            "name": "Maria Souza",
            "position": "Analista",
            "institution": "Universidade Federal",
            "active": true,
            "admissionDate": "2015-03-01T00:00:00Z"
        }
    })
}

#[tokio::test]
async fn employee_validation_confirms_and_hashes_cpf() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate-employee"))
        .and(body_partial_json(serde_json::json!({
            "cpfHash": hash_identifier(VALID_CPF),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(employee_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (validator, audit) = validator_for(&server.uri(), &server.uri());
    let outcome = validator
        .validate_employee("siape-100", VALID_CPF, VALID_CNPJ)
        .await
        .unwrap();

    assert!(outcome.valid);
    assert_eq!(outcome.data.unwrap().name, "Maria Souza");
    assert!(outcome.error.is_none());

    let entries = audit.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::EmployeeValidated);
    assert_eq!(entries[0].detail["valid"], true);
    // The raw CPF must never appear in the evidence trail either.
    assert_eq!(entries[0].detail["cpf_hash"], hash_identifier(VALID_CPF));
}

#[tokio::test]
async fn employee_not_found_is_rejected_not_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate-employee"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})),
        )
        .mount(&server)
        .await;

    let (validator, _audit) = validator_for(&server.uri(), &server.uri());
    let outcome = validator
        .validate_employee("siape-404", VALID_CPF, VALID_CNPJ)
        .await
        .unwrap();

    assert!(!outcome.valid);
    assert_eq!(outcome.error.as_deref(), Some("employee not found or inactive"));
    assert!(!outcome.is_unavailable());
}

#[tokio::test]
async fn malformed_cpf_fails_fast_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (validator, audit) = validator_for(&server.uri(), &server.uri());
    let result = validator
        .validate_employee("siape-100", "11111111111", VALID_CNPJ)
        .await;

    assert!(matches!(result, Err(TutelaError::Validation(_))));

    // Best-effort failure evidence is still recorded.
    let entries = audit.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::OperationFailed);
}

#[tokio::test]
async fn registry_outage_degrades_to_unavailable() {
    // Nothing listens on this port; the connection is refused.
    let (validator, audit) = validator_for("http://127.0.0.1:9", "http://127.0.0.1:9");
    let outcome = validator
        .validate_employee("siape-100", VALID_CPF, VALID_CNPJ)
        .await
        .unwrap();

    assert!(!outcome.valid);
    assert!(outcome.is_unavailable());

    let entries = audit.entries().await.unwrap();
    assert_eq!(entries[0].detail["error"], "service unavailable");
}

#[tokio::test]
async fn institution_validation_parses_type_strictly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/institution/{VALID_CNPJ}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "institution": {
                "name": "Fundo Municipal de Educacao",
                "type": "autarquia",
                "status": "active",
                "registrationDate": "2001-06-15T00:00:00Z",
                "address": {
                    "street": "Rua das Flores 100",
                    "city": "Curitiba",
                    "state": "PR",
                    "zipCode": "80000-000"
                }
            }
        })))
        .mount(&server)
        .await;

    let (validator, audit) = validator_for(&server.uri(), &server.uri());
    let outcome = validator.validate_institution(VALID_CNPJ).await.unwrap();

    assert!(outcome.valid);
    let record = outcome.data.unwrap();
    assert_eq!(record.institution_type, InstitutionType::Autarchy);
    assert_eq!(record.address.state, "PR");

    let entries = audit.entries().await.unwrap();
    assert_eq!(entries[0].action, AuditAction::InstitutionValidated);
}

#[tokio::test]
async fn unknown_institution_type_is_a_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "institution": {
                "name": "Entidade Desconhecida",
                "type": "paraestatal",
                "status": "active",
                "registrationDate": "2001-06-15T00:00:00Z",
                "address": {
                    "street": "-", "city": "-", "state": "SP", "zipCode": "-"
                }
            }
        })))
        .mount(&server)
        .await;

    let (validator, _audit) = validator_for(&server.uri(), &server.uri());
    let result = validator.validate_institution(VALID_CNPJ).await;
    assert!(matches!(result, Err(TutelaError::Validation(_))));
}

#[tokio::test]
async fn institution_not_found_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})),
        )
        .mount(&server)
        .await;

    let (validator, _audit) = validator_for(&server.uri(), &server.uri());
    let outcome = validator.validate_institution(VALID_CNPJ).await.unwrap();
    assert!(!outcome.valid);
    assert_eq!(outcome.error.as_deref(), Some("institution not found"));
}

#[tokio::test]
async fn connectivity_probe_reports_per_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (validator, _audit) = validator_for(&server.uri(), "http://127.0.0.1:9");
    let connectivity = validator.check_connectivity().await;
    assert!(connectivity.siape);
    assert!(!connectivity.sintegra);
}

#[tokio::test]
async fn principal_without_government_claims_passes_through() {
    let (validator, audit) = validator_for("http://127.0.0.1:9", "http://127.0.0.1:9");
    let principal = validator
        .validate_principal(AuthClaims {
            subject_id: "auth0|abc".to_string(),
            email: Some("user@example.org".to_string()),
            name: None,
            cpf: None,
            siape_id: None,
            institution_cnpj: None,
        })
        .await
        .unwrap();

    assert!(!principal.government_validated);
    assert!(principal.error.is_none());
    assert!(audit.is_empty().await);
}

#[tokio::test]
async fn principal_with_malformed_claim_gets_error_signal_not_failure() {
    let (validator, _audit) = validator_for("http://127.0.0.1:9", "http://127.0.0.1:9");
    let principal = validator
        .validate_principal(AuthClaims {
            subject_id: "auth0|abc".to_string(),
            email: None,
            name: None,
            cpf: Some("123".to_string()),
            siape_id: Some("siape-1".to_string()),
            institution_cnpj: Some(VALID_CNPJ.to_string()),
        })
        .await
        .unwrap();

    assert!(!principal.government_validated);
    assert!(principal.error.is_some());
}

#[tokio::test]
async fn principal_validated_when_registry_confirms() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/validate-employee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(employee_body()))
        .mount(&server)
        .await;

    let (validator, _audit) = validator_for(&server.uri(), &server.uri());
    let principal = validator
        .validate_principal(AuthClaims {
            subject_id: "auth0|abc".to_string(),
            email: None,
            name: None,
            cpf: Some(VALID_CPF.to_string()),
            siape_id: Some("siape-1".to_string()),
            institution_cnpj: Some(VALID_CNPJ.to_string()),
        })
        .await
        .unwrap();

    assert!(principal.government_validated);
    assert_eq!(principal.employee.unwrap().position, "Analista");
}
