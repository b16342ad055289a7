//! Shared application state

use crate::config::Settings;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use supportdesk_core::{OpenAiClient, Result};
use supportdesk_reply::{
    Composer, FulfillmentLookup, GroundedComposer, MockFulfillment, TemplateComposer,
};
use supportdesk_triage::{HeuristicClassifier, LlmClassifier, TriageAssembler};
use tracing::info;

/// Immutable per-process state cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub assembler: Arc<TriageAssembler>,
    pub composer: Arc<dyn Composer>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the classifier and composer strategies selected by `use_dummy_ai`
    pub fn from_settings(settings: Settings, metrics: Option<PrometheusHandle>) -> Result<Self> {
        let lookup: Arc<dyn FulfillmentLookup> =
            Arc::new(MockFulfillment::new(settings.fulfillment_latency()));

        let (assembler, composer) = if settings.use_dummy_ai {
            let composer: Arc<dyn Composer> =
                Arc::new(TemplateComposer::new(lookup).with_pacing(settings.stream_pacing()));
            (TriageAssembler::new(Arc::new(HeuristicClassifier::new()?))?, composer)
        } else {
            let client = Arc::new(OpenAiClient::new(
                settings.openai_base_url.clone(),
                settings.openai_api_key.clone(),
                settings.request_timeout(),
            )?);
            let classifier = LlmClassifier::new(client.clone(), settings.openai_model.clone());
            let composer: Arc<dyn Composer> = Arc::new(GroundedComposer::new(
                client,
                lookup,
                settings.openai_model.clone(),
            ));
            (TriageAssembler::new(Arc::new(classifier))?, composer)
        };

        info!(
            "Pipeline ready: mode={}, classifier={}, composer={}",
            settings.mode(),
            assembler.classifier_name(),
            composer.name()
        );

        Ok(Self {
            settings: Arc::new(settings),
            assembler: Arc::new(assembler),
            composer,
            metrics,
        })
    }
}
