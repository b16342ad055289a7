//! Classifier trait

use async_trait::async_trait;
use supportdesk_core::{Result, TriageRecord};

/// Strategy that turns redacted message text into a triage record.
///
/// Implementations may propose any order id; the assembler re-validates
/// it afterwards.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify text that has already passed through the PII redactor
    async fn classify(&self, redacted: &str) -> Result<TriageRecord>;

    /// Get the classifier name
    fn name(&self) -> &str;
}
