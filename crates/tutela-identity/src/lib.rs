//! National identifier validation and government registry integration.
//!
//! Two layers live here. The bottom layer is pure and stateless: exact
//! check-digit validation for the CPF (11-digit taxpayer id) and CNPJ
//! (14-digit employer registry id). The top layer is the
//! [`GovernmentValidator`], which orchestrates employee lookups against the
//! SIAPE registry and institution lookups against Sintegra — always guarded
//! by the local checksum first, with sensitive identifiers hashed before
//! transmission, and with registry outages degrading to an "unavailable"
//! outcome instead of an error.
//!
//! # Main types
//!
//! - [`is_valid_cpf`] / [`is_valid_cnpj`] — Pure checksum validators.
//! - [`GovernmentValidator`] — Registry lookup orchestration.
//! - [`ValidationOutcome`] — Uniform `{valid, data, error}` result shape.
//! - [`RegistryConfig`] — Registry endpoints, credentials, and timeout.
//! - [`AuthClaims`] / [`ValidatedPrincipal`] — Identity-provider enrichment.

/// Registry lookup client.
pub mod client;
/// CNPJ (employer registry id) validation.
pub mod cnpj;
/// Registry endpoint configuration.
pub mod config;
/// CPF (taxpayer id) validation.
pub mod cpf;
/// One-way hashing of sensitive identifiers.
pub mod hash;
/// Identity-provider principal enrichment.
pub mod principal;

pub use client::{
    EmployeeRecord, GovernmentValidator, InstitutionAddress, InstitutionRecord,
    RegistryConnectivity, ValidationOutcome,
};
pub use cnpj::is_valid_cnpj;
pub use config::RegistryConfig;
pub use cpf::is_valid_cpf;
pub use hash::hash_identifier;
pub use principal::{AuthClaims, ValidatedPrincipal};
