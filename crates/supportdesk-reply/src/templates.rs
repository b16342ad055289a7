//! Deterministic replies (no model involved)
//!
//! Streaming replays the buffered text word by word at a fixed pacing, so
//! concatenating the chunks always yields the buffered reply.

use crate::composer::Composer;
use crate::fulfillment::FulfillmentLookup;
use async_trait::async_trait;
use futures::stream;
use std::sync::Arc;
use std::time::Duration;
use supportdesk_core::{
    validate_order_id, Error, Intent, Language, OrderStatusInfo, Result, TokenStream,
    TriageRecord,
};
use tracing::debug;

/// Default delay between streamed words
pub const DEFAULT_STREAM_PACING: Duration = Duration::from_millis(40);

/// Localized reply fragments
struct Phrases {
    opener: &'static str,
    ask_order_id: &'static str,
    cancellation: &'static str,
    technical: &'static str,
}

const EN: Phrases = Phrases {
    opener: "Thanks for your message.",
    ask_order_id: "Please share your order number (e.g., A12345) so I can check the status.",
    cancellation: "I can start the cancellation. Please share your order number (if available) and the reason.",
    technical: "Please describe the technical issue briefly (device/browser, step, error message).",
};

const DE: Phrases = Phrases {
    opener: "Danke für Ihre Anfrage.",
    ask_order_id: "Bitte teilen Sie mir Ihre Bestellnummer mit (z. B. A12345), dann prüfe ich den Status.",
    cancellation: "Ich kann den Widerruf einleiten. Nennen Sie mir bitte (falls vorhanden) Ihre Bestellnummer und den Grund.",
    technical: "Bitte beschreiben Sie das technische Problem kurz (Gerät/Browser, Schritt, Fehlermeldung).",
};

fn phrases(language: Language) -> &'static Phrases {
    match language {
        Language::De => &DE,
        Language::En => &EN,
    }
}

fn on_its_way(language: Language, info: &OrderStatusInfo) -> String {
    match language {
        Language::De => format!(
            "Ihre Bestellung {} ist unterwegs ({}, Tracking: {}). Voraussichtliche Zustellung in ca. {} Tagen.",
            info.order_id, info.carrier, info.tracking, info.eta_days
        ),
        Language::En => format!(
            "Your order {} is on its way ({}, tracking: {}). Estimated delivery in ~{} days.",
            info.order_id, info.carrier, info.tracking, info.eta_days
        ),
    }
}

/// Split text at single spaces: the first word bare, every following word
/// prefixed with one space.
pub fn word_chunks(text: &str) -> Vec<String> {
    text.split(' ')
        .enumerate()
        .map(|(i, word)| if i == 0 { word.to_string() } else { format!(" {}", word) })
        .collect()
}

/// Template composer with an order-status lookup
pub struct TemplateComposer {
    lookup: Arc<dyn FulfillmentLookup>,
    pacing: Duration,
}

impl TemplateComposer {
    pub fn new(lookup: Arc<dyn FulfillmentLookup>) -> Self {
        Self {
            lookup,
            pacing: DEFAULT_STREAM_PACING,
        }
    }

    /// Set the delay between streamed words
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    async fn render(&self, triage: &TriageRecord) -> Result<String> {
        let language = triage.language;
        let phrases = phrases(language);

        let body = match triage.intent {
            Intent::OrderStatus => match triage.order_id().and_then(validate_order_id) {
                Some(order_id) => {
                    let info = self.lookup.order_status(&order_id).await?;
                    Some(on_its_way(language, &info))
                }
                None => Some(phrases.ask_order_id.to_string()),
            },
            Intent::Cancellation => Some(phrases.cancellation.to_string()),
            Intent::Technical => Some(phrases.technical.to_string()),
            Intent::Other => None,
        };

        debug!("Template reply: intent={}, language={}", triage.intent, language);

        Ok(match body {
            Some(body) => format!("{} {}", phrases.opener, body),
            None => phrases.opener.to_string(),
        })
    }
}

#[async_trait]
impl Composer for TemplateComposer {
    async fn compose(&self, _message: &str, triage: &TriageRecord) -> Result<String> {
        self.render(triage).await
    }

    async fn compose_stream(&self, _message: &str, triage: &TriageRecord) -> Result<TokenStream> {
        let text = self.render(triage).await?;
        let pacing = self.pacing;

        let chunks = stream::unfold(
            (word_chunks(&text).into_iter(), true),
            move |(mut words, first)| async move {
                let word = words.next()?;
                if !first {
                    tokio::time::sleep(pacing).await;
                }
                Some((Ok::<_, Error>(word), (words, false)))
            },
        );

        Ok(Box::pin(chunks))
    }

    fn name(&self) -> &str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::MockFulfillment;
    use futures::StreamExt;
    use tokio::time::Instant;

    fn composer() -> TemplateComposer {
        TemplateComposer::new(Arc::new(MockFulfillment::default()))
    }

    fn triage(intent: Intent, language: Language, order_id: Option<&str>) -> TriageRecord {
        TriageRecord::new(intent, language, 0.9).with_order_id(order_id.map(str::to_string))
    }

    #[test]
    fn test_word_chunks() {
        assert_eq!(word_chunks("a b  c"), vec!["a", " b", " ", " c"]);
        assert_eq!(word_chunks(""), vec![""]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_status_with_id() {
        let reply = composer()
            .compose("", &triage(Intent::OrderStatus, Language::En, Some("A12345")))
            .await
            .unwrap();

        assert_eq!(
            reply,
            "Thanks for your message. Your order A12345 is on its way (DHL, tracking: 00340434123DE). Estimated delivery in ~2 days."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_status_german_with_id() {
        let reply = composer()
            .compose("", &triage(Intent::OrderStatus, Language::De, Some("a123456")))
            .await
            .unwrap();

        assert!(
            reply.starts_with("Danke für Ihre Anfrage. Ihre Bestellung A123456 ist unterwegs")
        );
        assert!(reply.contains("00340434123DE"));
    }

    #[tokio::test]
    async fn test_order_status_without_id_asks_for_it() {
        let reply = composer()
            .compose("Where is my order?", &triage(Intent::OrderStatus, Language::En, None))
            .await
            .unwrap();
        assert_eq!(
            reply,
            "Thanks for your message. Please share your order number (e.g., A12345) so I can check the status."
        );
    }

    #[tokio::test]
    async fn test_invalid_id_is_not_looked_up() {
        let reply = composer()
            .compose("", &triage(Intent::OrderStatus, Language::De, Some("TRACKING")))
            .await
            .unwrap();
        assert!(reply.contains("Bitte teilen Sie mir Ihre Bestellnummer mit"));
        assert!(!reply.contains("DHL"));
    }

    #[tokio::test]
    async fn test_other_intents() {
        let c = composer();
        let cancel = c
            .compose("", &triage(Intent::Cancellation, Language::En, None))
            .await
            .unwrap();
        assert_eq!(
            cancel,
            "Thanks for your message. I can start the cancellation. Please share your order number (if available) and the reason."
        );

        let technical = c
            .compose("", &triage(Intent::Technical, Language::De, None))
            .await
            .unwrap();
        assert!(technical.ends_with("(Gerät/Browser, Schritt, Fehlermeldung)."));

        let other = c.compose("", &triage(Intent::Other, Language::De, None)).await.unwrap();
        assert_eq!(other, "Danke für Ihre Anfrage.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_concatenates_to_buffered_reply() {
        let c = composer();
        let record = triage(Intent::OrderStatus, Language::En, Some("A12345"));
        let buffered = c.compose("", &record).await.unwrap();

        let chunks: Vec<String> = c
            .compose_stream("", &record)
            .await
            .unwrap()
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(chunks[0], "Thanks");
        assert!(chunks[1..].iter().all(|c| c.starts_with(' ')));
        assert_eq!(chunks.concat(), buffered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_is_paced() {
        let c = composer().with_pacing(Duration::from_millis(40));
        let record = triage(Intent::Other, Language::En, None);

        let start = Instant::now();
        let chunks: Vec<_> = c.compose_stream("", &record).await.unwrap().collect().await;

        // "Thanks for your message." is four words, three pauses
        assert_eq!(chunks.len(), 4);
        assert!(start.elapsed() >= Duration::from_millis(120));
    }
}
