//! Replies written by a chat-completion model, grounded in the triage record
//! and the order-status lookup.

use crate::composer::Composer;
use crate::fulfillment::FulfillmentLookup;
use async_trait::async_trait;
use std::sync::Arc;
use supportdesk_core::{
    validate_order_id, ChatCompletion, ChatCompletionRequest, ChatMessage, Intent, Language,
    Result, TokenStream, TriageRecord,
};
use tracing::{debug, info};

/// Sampling temperature for replies
pub const REPLY_TEMPERATURE: f32 = 0.2;

fn system_rules(language: Language) -> String {
    format!(
        "You are a support assistant. Respond briefly, politely and in the user's language ({}).\n\
         - Never invent order numbers, tracking codes or carriers. Use only provided toolContext.\n\
         - If no valid orderId is present for order_status intent, ask for it with an example.\n\
         - Keep PII out of logs; do not echo emails or phone numbers.\n\
         - Prefer bullet-like clarity in 1-2 sentences.",
        language
    )
}

fn missing_order_id_note(language: Language) -> &'static str {
    match language {
        Language::De => "Hinweis: Es liegt keine valide Bestellnummer vor. Bitte freundlich nach der Nummer fragen (Beispiel: A12345).",
        Language::En => "Note: No valid order number present. Politely ask for it (example: A12345).",
    }
}

/// Composer that delegates the wording to a chat-completion model
pub struct GroundedComposer {
    client: Arc<dyn ChatCompletion>,
    lookup: Arc<dyn FulfillmentLookup>,
    model: String,
}

impl GroundedComposer {
    pub fn new(
        client: Arc<dyn ChatCompletion>,
        lookup: Arc<dyn FulfillmentLookup>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            lookup,
            model: model.into(),
        }
    }

    /// Build the grounded request.
    ///
    /// Fails with a missing-credential error before the lookup runs.
    pub async fn build_request(
        &self,
        message: &str,
        triage: &TriageRecord,
    ) -> Result<ChatCompletionRequest> {
        self.client.ensure_ready()?;

        let language = triage.language;
        let order_id = triage.order_id().and_then(validate_order_id);

        let mut grounded = triage.clone();
        grounded.entities.order_id = order_id.clone();

        let tool_context = match (triage.intent, order_id.as_deref()) {
            (Intent::OrderStatus, Some(id)) => {
                let info = self.lookup.order_status(id).await?;
                Some(format!(
                    "Tool:getOrderStatus => {}",
                    serde_json::to_string(&info)?
                ))
            }
            _ => None,
        };

        let mut messages = vec![
            ChatMessage::system(system_rules(language)),
            ChatMessage::system(format!("LANG:{}", language)),
            ChatMessage::system(format!("TRIAGE:{}", serde_json::to_string(&grounded)?)),
        ];
        if let Some(context) = tool_context {
            messages.push(ChatMessage::system(context));
        }
        messages.push(ChatMessage::user(message));
        if triage.intent == Intent::OrderStatus && order_id.is_none() {
            messages.push(ChatMessage::system(missing_order_id_note(language)));
        }

        debug!(
            "Grounded request: {} messages, order_id_valid={}",
            messages.len(),
            order_id.is_some()
        );

        Ok(ChatCompletionRequest::new(
            self.model.clone(),
            REPLY_TEMPERATURE,
            messages,
        ))
    }
}

#[async_trait]
impl Composer for GroundedComposer {
    async fn compose(&self, message: &str, triage: &TriageRecord) -> Result<String> {
        let request = self.build_request(message, triage).await?;
        let reply = self.client.complete(request).await?;
        info!("Grounded reply received ({} bytes)", reply.len());
        Ok(reply.trim().to_string())
    }

    async fn compose_stream(&self, message: &str, triage: &TriageRecord) -> Result<TokenStream> {
        let request = self.build_request(message, triage).await?;
        self.client.stream(request).await
    }

    fn name(&self) -> &str {
        "grounded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::MockFulfillment;
    use futures::{stream, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use supportdesk_core::{Error, OrderStatusInfo, API_KEY_VAR};

    /// Chat backend that records requests and answers with fixed text
    #[derive(Default)]
    struct ScriptedCompletion {
        seen: Mutex<Vec<ChatCompletionRequest>>,
        missing_key: bool,
    }

    #[async_trait]
    impl ChatCompletion for ScriptedCompletion {
        fn ensure_ready(&self) -> Result<()> {
            if self.missing_key {
                Err(Error::MissingCredential(API_KEY_VAR))
            } else {
                Ok(())
            }
        }

        async fn complete(&self, request: ChatCompletionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request);
            Ok("  Your parcel is on its way.\n".to_string())
        }

        async fn stream(&self, request: ChatCompletionRequest) -> Result<TokenStream> {
            self.seen.lock().unwrap().push(request);
            let tokens = vec![Ok("Hel".to_string()), Ok("lo".to_string())];
            Ok(Box::pin(stream::iter(tokens)))
        }
    }

    /// Lookup that counts calls
    #[derive(Default)]
    struct CountingLookup(AtomicUsize);

    #[async_trait]
    impl FulfillmentLookup for CountingLookup {
        async fn order_status(&self, order_id: &str) -> Result<OrderStatusInfo> {
            self.0.fetch_add(1, Ordering::SeqCst);
            MockFulfillment::new(std::time::Duration::ZERO)
                .order_status(order_id)
                .await
        }
    }

    fn triage(intent: Intent, language: Language, order_id: Option<&str>) -> TriageRecord {
        TriageRecord::new(intent, language, 0.8).with_order_id(order_id.map(str::to_string))
    }

    #[tokio::test]
    async fn test_grounding_with_valid_order_id() {
        let client = Arc::new(ScriptedCompletion::default());
        let lookup = Arc::new(CountingLookup::default());
        let composer = GroundedComposer::new(client.clone(), lookup.clone(), "gpt-4o-mini");

        let reply = composer
            .compose("Where is A12345?", &triage(Intent::OrderStatus, Language::En, Some("a12345")))
            .await
            .unwrap();
        assert_eq!(reply, "Your parcel is on its way.");
        assert_eq!(lookup.0.load(Ordering::SeqCst), 1);

        let seen = client.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.temperature, REPLY_TEMPERATURE);
        assert_eq!(request.response_format, None);

        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert!(contents[0].contains("(en)"));
        assert_eq!(contents[1], "LANG:en");
        assert!(contents[2].starts_with("TRIAGE:"));
        assert!(contents[2].contains(r#""orderId":"A12345""#));
        assert!(contents[3].starts_with("Tool:getOrderStatus => "));
        assert!(contents[3].contains(r#""tracking":"00340434123DE""#));
        assert_eq!(request.messages[4], ChatMessage::user("Where is A12345?"));
        assert_eq!(request.messages.len(), 5);
    }

    #[tokio::test]
    async fn test_missing_order_id_adds_localized_note() {
        let client = Arc::new(ScriptedCompletion::default());
        let lookup = Arc::new(CountingLookup::default());
        let composer = GroundedComposer::new(client.clone(), lookup.clone(), "m");

        composer
            .compose(
                "Wo ist mein Paket?",
                &triage(Intent::OrderStatus, Language::De, Some("STATUS")),
            )
            .await
            .unwrap();
        assert_eq!(lookup.0.load(Ordering::SeqCst), 0);

        let seen = client.seen.lock().unwrap();
        let messages = &seen[0].messages;
        assert!(!messages.iter().any(|m| m.content.starts_with("Tool:")));
        assert!(!messages[2].content.contains("orderId"));
        let last = messages.last().unwrap();
        assert_eq!(last.role, "system");
        assert!(last.content.starts_with("Hinweis: Es liegt keine valide Bestellnummer vor."));
    }

    #[tokio::test]
    async fn test_no_note_for_other_intents() {
        let client = Arc::new(ScriptedCompletion::default());
        let lookup = Arc::new(CountingLookup::default());
        let composer = GroundedComposer::new(client.clone(), lookup, "m");

        composer
            .compose("The app crashes", &triage(Intent::Technical, Language::En, None))
            .await
            .unwrap();

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].messages.last().unwrap().role, "user");
    }

    #[tokio::test]
    async fn test_missing_credential_skips_lookup() {
        let client = Arc::new(ScriptedCompletion {
            missing_key: true,
            ..Default::default()
        });
        let lookup = Arc::new(CountingLookup::default());
        let composer = GroundedComposer::new(client.clone(), lookup.clone(), "m");
        let record = triage(Intent::OrderStatus, Language::En, Some("A12345"));

        let err = composer.compose("hi", &record).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing OPENAI_API_KEY");
        assert!(composer.compose_stream("hi", &record).await.is_err());

        assert_eq!(lookup.0.load(Ordering::SeqCst), 0);
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stream_passes_tokens_through() {
        let client = Arc::new(ScriptedCompletion::default());
        let composer = GroundedComposer::new(client, Arc::new(CountingLookup::default()), "m");

        let tokens: Vec<String> = composer
            .compose_stream("hi", &triage(Intent::Other, Language::En, None))
            .await
            .unwrap()
            .map(|t| t.unwrap())
            .collect()
            .await;
        assert_eq!(tokens.concat(), "Hello");
    }
}
