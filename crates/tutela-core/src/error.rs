use thiserror::Error;

/// A convenience `Result` alias using [`TutelaError`].
pub type TutelaResult<T> = Result<T, TutelaError>;

/// Top-level error type for the Tutela compliance core.
///
/// The three domain variants map directly onto the three failure classes
/// callers must distinguish: malformed input ([`TutelaError::Validation`]),
/// business-rule rejections ([`TutelaError::Compliance`]), and degraded
/// external collaborators ([`TutelaError::ServiceUnavailable`]). A failed
/// audit write is its own variant because it is fatal to the operation that
/// triggered it.
#[derive(Debug, Error)]
pub enum TutelaError {
    /// Malformed client input (short purpose text, short erasure reason,
    /// malformed national identifier). Never retried automatically.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A business-rule violation, e.g. responding to a consent request that
    /// was never made, or erasure blocked by a legal hold.
    #[error("Compliance error: {0}")]
    Compliance(String),

    /// An external registry or notifier was unreachable or timed out. Must
    /// never be conflated with "invalid" or "denied".
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The audit trail could not be written. Fatal to the triggering
    /// operation: an un-audited compliance action must not report success.
    #[error("Audit error: {0}")]
    Audit(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
