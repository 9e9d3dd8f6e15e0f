use crate::error::TutelaResult;
use async_trait::async_trait;

/// Outbound delivery of breach notifications.
///
/// The breach workflow decides *who* must be told and by *when*; this trait
/// only carries the delivery. Delivery failures must be returned to the
/// caller so it can decide on retry — the core never retries on its own.
#[async_trait]
pub trait AuthorityNotifier: Send + Sync {
    /// Deliver a breach notification to a named authority (e.g. "ANPD").
    async fn notify_authority(
        &self,
        authority: &str,
        payload: serde_json::Value,
    ) -> TutelaResult<()>;

    /// Deliver a breach notification to the affected subjects.
    async fn notify_subjects(
        &self,
        subject_ids: &[String],
        payload: serde_json::Value,
    ) -> TutelaResult<()>;
}
