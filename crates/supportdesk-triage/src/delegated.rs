//! Triage delegated to a chat-completion model with structured output

use crate::classifier::Classifier;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use supportdesk_core::{
    ChatCompletion, ChatCompletionRequest, ChatMessage, Error, Result, SchemaIssue, TriageRecord,
};
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = r#"You are a support triage assistant. Answer ONLY with JSON exactly matching this schema:
{
  "intent": "order_status|cancellation|technical|other",
  "urgency": "low|medium|high",
  "entities": { "orderId"?: string, "email"?: string, "name"?: string },
  "language": "de|en",
  "confidence": number
}
- Be conservative. Do not hallucinate. Use only the allowed fields.
- Set "orderId" only when it is unambiguous (letters/digits/hyphen, at least one digit, 5..24 characters)."#;

/// Strict JSON schema sent as `response_format`
pub fn triage_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "triage_schema",
            "strict": true,
            "schema": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "intent": { "enum": ["order_status", "cancellation", "technical", "other"] },
                    "urgency": { "enum": ["low", "medium", "high"] },
                    "entities": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "orderId": { "type": "string" },
                            "email": { "type": "string" },
                            "name": { "type": "string" }
                        }
                    },
                    "language": { "enum": ["de", "en"] },
                    "confidence": { "type": "number" }
                },
                "required": ["intent", "urgency", "entities", "language", "confidence"]
            }
        }
    })
}

/// Classifier backed by a chat-completion model at temperature 0
pub struct LlmClassifier {
    client: Arc<dyn ChatCompletion>,
    model: String,
}

impl LlmClassifier {
    pub fn new(client: Arc<dyn ChatCompletion>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn request(&self, redacted: &str) -> ChatCompletionRequest {
        ChatCompletionRequest::new(
            self.model.clone(),
            0.0,
            vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(redacted)],
        )
        .with_response_format(triage_response_format())
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, redacted: &str) -> Result<TriageRecord> {
        self.client.ensure_ready()?;

        let content = self.client.complete(self.request(redacted)).await?;
        if content.trim().is_empty() {
            warn!("Model triage came back without content");
            return Err(Error::EmptyCompletion);
        }
        debug!("Model triage received ({} bytes)", content.len());

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            warn!("Model triage is not valid JSON: {}", e);
            Error::Schema(vec![SchemaIssue::new("", format!("invalid JSON: {}", e))])
        })?;

        TriageRecord::from_value(&value).map_err(|e| {
            warn!("Model triage failed schema validation: {}", e);
            e
        })
    }

    fn name(&self) -> &str {
        "llm"
    }
}
