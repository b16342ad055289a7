//! Order identifier extraction and validation
//!
//! [`validate_order_id`] is the single filter every entry point runs before
//! an order id is used: extraction from raw text, post-processing of a
//! model-produced triage, and the pre-flight check in the reply composers.
//! Nothing downstream trusts an order id that did not pass through it.

use crate::{Error, Result};
use regex::Regex;

/// Inclusive length bounds of a normalized order id
pub const MIN_ORDER_ID_LEN: usize = 5;
pub const MAX_ORDER_ID_LEN: usize = 24;

/// Tokens that look like ids after a keyword but are just more keywords
const STOP_WORDS: [&str; 9] = [
    "ORDER",
    "BESTELLUNG",
    "AUFTRAG",
    "STATUS",
    "TRACK",
    "SENDUNG",
    "DELIVERY",
    "SHIPMENT",
    "TRACKING",
];

/// Normalize and validate an order id candidate.
///
/// Returns the trimmed, uppercased id, or `None` when the candidate is
/// outside 5..=24 characters, contains anything but `A-Z`, `0-9` and `-`,
/// is a stop-word, or has no digit. Idempotent on its own output.
pub fn validate_order_id(candidate: &str) -> Option<String> {
    let id = candidate.trim().to_uppercase();

    let len = id.chars().count();
    if !(MIN_ORDER_ID_LEN..=MAX_ORDER_ID_LEN).contains(&len) {
        return None;
    }

    if !id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-') {
        return None;
    }

    if STOP_WORDS.contains(&id.as_str()) {
        return None;
    }

    if !id.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(id)
}

/// Finds order id candidates in free text
#[derive(Debug, Clone)]
pub struct OrderIdExtractor {
    keyword_regex: Regex,
    token_regex: Regex,
}

impl OrderIdExtractor {
    /// Create a new extractor
    pub fn new() -> Result<Self> {
        Ok(Self {
            keyword_regex: Regex::new(
                r"(?i)(bestell(?:ung)?|order(?:-?id)?|auftrag(?:s)?nr\.?|ord(?:er)?\s*#?)[:\s-]*([A-Z0-9][A-Z0-9-]*[0-9][A-Z0-9-]*)",
            )
            .map_err(|e| {
                Error::config(format!("Failed to compile order keyword regex: {}", e))
            })?,
            // ASCII word boundaries: a trailing umlaut still ends the token
            token_regex: Regex::new(r"(?i)(?-u:\b)([A-Z0-9][A-Z0-9-]*[0-9][A-Z0-9-]{3,})(?-u:\b)")
                .map_err(|e| {
                    Error::config(format!("Failed to compile order token regex: {}", e))
                })?,
        })
    }

    /// Raw candidate before validation.
    ///
    /// A token right after an order keyword wins; otherwise the first
    /// standalone alphanumeric token with a digit and at least 5 characters.
    pub fn candidate<'t>(&self, text: &'t str) -> Option<&'t str> {
        if let Some(caps) = self.keyword_regex.captures(text) {
            if let Some(m) = caps.get(2) {
                return Some(m.as_str());
            }
        }

        self.token_regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Extract and validate an order id from free text
    pub fn extract(&self, text: &str) -> Option<String> {
        self.candidate(text).and_then(validate_order_id)
    }
}
