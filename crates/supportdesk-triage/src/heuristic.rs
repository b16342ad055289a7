//! Rule-based triage (no model involved)
//!
//! Keyword families are matched with Aho-Corasick over the lower-cased
//! text. Intent families are tested in priority order and the first family
//! with any hit wins.

use crate::classifier::Classifier;
use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use supportdesk_core::{Error, Intent, Language, OrderIdExtractor, Result, TriageRecord};
use tracing::debug;

/// Fixed confidence reported by the heuristic classifier
pub const HEURISTIC_CONFIDENCE: f64 = 0.9;

const CANCELLATION_TERMS: &[&str] = &["widerruf", "storno", "cancel", "refund", "return"];
const ORDER_TERMS: &[&str] = &[
    "bestell", "order", "status", "track", "sendung", "shipment", "delivery", "tracking",
];
const TECHNICAL_TERMS: &[&str] = &[
    "technik", "error", "bug", "crash", "stürzt", "problem", "issue", "fault",
];

const GERMAN_HINTS: &[&str] = &[
    "ä", "ö", "ü", "ß", "bestell", "auftrag", "widerruf", "storno", "retoure", "rücksend",
    "liefer", "paket", "versand",
];
const ENGLISH_HINTS: &[&str] = &[
    "order", "cancel", "return", "refund", "shipment", "delivery", "tracking",
];

fn build(name: &str, patterns: &[&str]) -> Result<AhoCorasick> {
    AhoCorasick::new(patterns)
        .map_err(|e| Error::config(format!("Failed to build {} matcher: {}", name, e)))
}

fn has_umlaut(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, 'ä' | 'ö' | 'ü' | 'ß' | 'Ä' | 'Ö' | 'Ü' | 'ẞ'))
}

/// Keyword-family detector for intent and language
#[derive(Debug, Clone)]
pub struct KeywordDetector {
    /// Intent families in priority order
    intents: Vec<(Intent, AhoCorasick)>,
    german: AhoCorasick,
    english: AhoCorasick,
}

impl KeywordDetector {
    /// Create a new detector
    pub fn new() -> Result<Self> {
        Ok(Self {
            intents: vec![
                (Intent::Cancellation, build("cancellation", CANCELLATION_TERMS)?),
                (Intent::OrderStatus, build("order", ORDER_TERMS)?),
                (Intent::Technical, build("technical", TECHNICAL_TERMS)?),
            ],
            german: build("german", GERMAN_HINTS)?,
            english: build("english", ENGLISH_HINTS)?,
        })
    }

    /// First matching intent family, `other` when none matches
    pub fn detect_intent(&self, text: &str) -> Intent {
        let lower = text.to_lowercase();
        self.intents
            .iter()
            .find(|(_, matcher)| matcher.is_match(&lower))
            .map_or(Intent::Other, |(intent, _)| *intent)
    }

    /// German vs. English.
    ///
    /// Unambiguous keyword hits decide; otherwise an umlaut or ß means
    /// German and everything else English.
    pub fn detect_language(&self, text: &str) -> Language {
        let lower = text.to_lowercase();
        let de_hit = self.german.is_match(&lower);
        let en_hit = self.english.is_match(&lower);

        match (de_hit, en_hit) {
            (true, false) => Language::De,
            (false, true) => Language::En,
            _ if has_umlaut(text) => Language::De,
            _ => Language::En,
        }
    }
}

/// Triage from keyword heuristics and the order-id extractor
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    detector: KeywordDetector,
    extractor: OrderIdExtractor,
}

impl HeuristicClassifier {
    /// Create a new heuristic classifier
    pub fn new() -> Result<Self> {
        Ok(Self {
            detector: KeywordDetector::new()?,
            extractor: OrderIdExtractor::new()?,
        })
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    async fn classify(&self, redacted: &str) -> Result<TriageRecord> {
        let intent = self.detector.detect_intent(redacted);
        let language = self.detector.detect_language(redacted);
        let order_id = match intent {
            Intent::OrderStatus => self.extractor.extract(redacted),
            _ => None,
        };

        debug!(
            "Heuristic triage: intent={}, language={}, order_id_found={}",
            intent,
            language,
            order_id.is_some()
        );

        Ok(TriageRecord::new(intent, language, HEURISTIC_CONFIDENCE).with_order_id(order_id))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
