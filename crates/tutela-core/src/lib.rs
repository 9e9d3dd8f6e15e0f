//! Core types and collaborator traits for the Tutela compliance framework.
//!
//! This crate provides the foundation shared across all Tutela crates:
//! the unified error enum, the closed domain enumerations (purpose
//! categories, data categories, institution types, breach severity), and
//! the capability traits through which the core talks to its external
//! collaborators (persistence, outbound HTTP, authority notification).
//!
//! # Main types
//!
//! - [`TutelaError`] — Unified error enum for all Tutela subsystems.
//! - [`TutelaResult`] — Convenience alias for `Result<T, TutelaError>`.
//! - [`PurposeCategory`] — Enumerated reason for processing personal data.
//! - [`DataCategory`] — Category of personal data held for a subject.
//! - [`RecordStore`] — Persistence capability ({get, put, delete}).
//! - [`HttpTransport`] — Outbound HTTP capability ({request}).
//! - [`AuthorityNotifier`] — Outbound breach-notification capability.

/// Error types.
pub mod error;
/// Outbound HTTP transport trait and reqwest-backed implementation.
pub mod http;
/// Outbound notification trait for breach workflows.
pub mod notify;
/// Persistence capability trait and in-memory implementation.
pub mod store;
/// Closed domain enumerations and privacy-control descriptors.
pub mod types;

pub use error::{TutelaError, TutelaResult};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport};
pub use notify::AuthorityNotifier;
pub use store::{MemoryStore, RecordStore};
pub use types::{
    BreachSeverity, DataCategory, InstitutionType, LegalBasis, PrivacyControls, PurposeCategory,
    RetentionGround,
};
