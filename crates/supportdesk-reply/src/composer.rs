//! Composer trait

use async_trait::async_trait;
use supportdesk_core::{Result, TokenStream, TriageRecord};

/// Strategy that writes the customer-facing reply for a triaged message.
///
/// Implementations must not trust `triage.entities.orderId`; it is
/// re-validated before any lookup.
#[async_trait]
pub trait Composer: Send + Sync {
    /// Buffered reply
    async fn compose(&self, message: &str, triage: &TriageRecord) -> Result<String>;

    /// Incremental reply. Failures before the first chunk are returned as
    /// `Err`; later failures end the stream with an error item.
    async fn compose_stream(&self, message: &str, triage: &TriageRecord) -> Result<TokenStream>;

    /// Get the composer name
    fn name(&self) -> &str;
}
