//! Triage assembler: redaction, classification and order-id post-processing

use crate::classifier::Classifier;
use crate::pii::PiiRedactor;
use std::sync::Arc;
use std::time::Instant;
use supportdesk_core::{validate_order_id, Error, Intent, OrderIdExtractor, Result, TriageRecord};
use tracing::{debug, info};

/// Turns a raw support message into a validated [`TriageRecord`]
pub struct TriageAssembler {
    redactor: PiiRedactor,
    extractor: OrderIdExtractor,
    classifier: Arc<dyn Classifier>,
}

impl TriageAssembler {
    /// Create an assembler around a classifier strategy
    pub fn new(classifier: Arc<dyn Classifier>) -> Result<Self> {
        Ok(Self {
            redactor: PiiRedactor::new()?,
            extractor: OrderIdExtractor::new()?,
            classifier,
        })
    }

    /// Name of the classifier strategy in use
    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Redact, classify and post-process one message.
    ///
    /// Whatever the classifier proposes as order id is re-validated; if it
    /// proposes none, the id is extracted from the redacted text. The id is
    /// dropped for every intent except `order_status`.
    ///
    /// A message that is empty or only whitespace is rejected as a
    /// validation error before anything is redacted or sent out.
    pub async fn assemble(&self, message: &str) -> Result<TriageRecord> {
        if message.trim().is_empty() {
            return Err(Error::validation("message is required"));
        }

        let start = Instant::now();
        let redacted = self.redactor.redact(message);
        debug!(
            "Redacted message ({} -> {} bytes)",
            message.len(),
            redacted.len()
        );

        let record = self.classifier.classify(&redacted).await?;
        let record = self.post_process(record, &redacted);

        info!(
            "Triage by {}: intent={}, language={}, order_id_found={} ({:?})",
            self.classifier.name(),
            record.intent,
            record.language,
            record.order_id().is_some(),
            start.elapsed()
        );

        Ok(record)
    }

    fn post_process(&self, mut record: TriageRecord, redacted: &str) -> TriageRecord {
        let proposed = record
            .entities
            .order_id
            .take()
            .filter(|id| !id.trim().is_empty());

        record.entities.order_id = match record.intent {
            Intent::OrderStatus => match proposed {
                Some(id) => validate_order_id(&id),
                None => self.extractor.extract(redacted),
            },
            _ => None,
        };
        record
    }
}
