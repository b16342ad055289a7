//! Core types for SupportDesk

use crate::error::{Error, Result, SchemaIssue};
use crate::order_id::validate_order_id;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Confidence assigned when the upstream omits one
pub const DEFAULT_CONFIDENCE: f64 = 0.6;

/// Coarse intent of a support message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    OrderStatus,
    Cancellation,
    Technical,
    Other,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::OrderStatus,
        Intent::Cancellation,
        Intent::Technical,
        Intent::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderStatus => "order_status",
            Self::Cancellation => "cancellation",
            Self::Technical => "technical",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == value)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a support message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Low, Urgency::Medium, Urgency::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == value)
    }
}

/// Reply language. Only German and English are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "de" => Some(Self::De),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities extracted from a support message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entities {
    /// Normalized order identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Validated classification of a single support message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageRecord {
    pub intent: Intent,

    #[serde(default)]
    pub urgency: Urgency,

    #[serde(default)]
    pub entities: Entities,

    pub language: Language,

    /// Classifier confidence in [0, 1]
    pub confidence: f64,
}

impl TriageRecord {
    /// Create a record with low urgency and no entities.
    ///
    /// `confidence` is clamped to [0, 1]; NaN becomes 0.
    pub fn new(intent: Intent, language: Language, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            intent,
            urgency: Urgency::Low,
            entities: Entities::default(),
            language,
            confidence,
        }
    }

    /// Set the order id (unvalidated, see [`TriageRecord::enforce_order_id`])
    pub fn with_order_id(mut self, order_id: Option<String>) -> Self {
        self.entities.order_id = order_id;
        self
    }

    /// The stored order id, if any
    pub fn order_id(&self) -> Option<&str> {
        self.entities.order_id.as_deref()
    }

    /// Re-run the order-id validator over the stored value and drop it
    /// entirely unless the intent is `order_status`.
    pub fn enforce_order_id(&mut self) {
        self.entities.order_id = match self.intent {
            Intent::OrderStatus => self.entities.order_id.as_deref().and_then(validate_order_id),
            _ => None,
        };
    }

    /// Validate an untrusted JSON value against the triage schema.
    ///
    /// All violations are collected and returned together as
    /// [`Error::Schema`]. Missing `urgency`, `language` and `confidence`
    /// take their defaults (`low`, `de`, `0.6`).
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(Error::Schema(vec![SchemaIssue::new("", "expected object")]));
        };

        let mut issues = Vec::new();

        let intent = match obj.get("intent") {
            None => {
                issues.push(SchemaIssue::new("intent", "required"));
                None
            }
            Some(v) => parse_enum(
                v,
                "intent",
                Intent::parse,
                "order_status, cancellation, technical, other",
                &mut issues,
            ),
        };

        let urgency = match obj.get("urgency") {
            None => Some(Urgency::default()),
            Some(v) => parse_enum(v, "urgency", Urgency::parse, "low, medium, high", &mut issues),
        };

        let entities = match obj.get("entities") {
            None => {
                issues.push(SchemaIssue::new("entities", "required"));
                None
            }
            Some(Value::Object(map)) => parse_entities(map, &mut issues),
            Some(_) => {
                issues.push(SchemaIssue::new("entities", "expected object"));
                None
            }
        };

        let language = match obj.get("language") {
            None => Some(Language::De),
            Some(v) => parse_enum(v, "language", Language::parse, "de, en", &mut issues),
        };

        let confidence = match obj.get("confidence") {
            None => Some(DEFAULT_CONFIDENCE),
            Some(v) => match v.as_f64() {
                Some(c) if (0.0..=1.0).contains(&c) => Some(c),
                Some(_) => {
                    issues.push(SchemaIssue::new("confidence", "must be within [0, 1]"));
                    None
                }
                None => {
                    issues.push(SchemaIssue::new("confidence", "expected number"));
                    None
                }
            },
        };

        match (intent, urgency, entities, language, confidence) {
            (Some(intent), Some(urgency), Some(entities), Some(language), Some(confidence))
                if issues.is_empty() =>
            {
                Ok(Self {
                    intent,
                    urgency,
                    entities,
                    language,
                    confidence,
                })
            }
            _ => Err(Error::Schema(issues)),
        }
    }
}

fn parse_enum<T>(
    value: &Value,
    path: &str,
    parse: impl Fn(&str) -> Option<T>,
    expected: &str,
    issues: &mut Vec<SchemaIssue>,
) -> Option<T> {
    match value.as_str() {
        Some(s) => {
            let parsed = parse(s);
            if parsed.is_none() {
                issues.push(SchemaIssue::new(path, format!("expected one of {}", expected)));
            }
            parsed
        }
        None => {
            issues.push(SchemaIssue::new(path, "expected string"));
            None
        }
    }
}

fn parse_entities(map: &Map<String, Value>, issues: &mut Vec<SchemaIssue>) -> Option<Entities> {
    let before = issues.len();

    let mut string_field = |key: &str| -> Option<String> {
        match map.get(key) {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                issues.push(SchemaIssue::new(format!("entities.{}", key), "expected string"));
                None
            }
        }
    };

    let order_id = string_field("orderId");
    let email = string_field("email");
    let name = string_field("name");

    if let Some(ref email) = email {
        if !looks_like_email(email) {
            issues.push(SchemaIssue::new("entities.email", "invalid email"));
        }
    }

    (issues.len() == before).then_some(Entities {
        order_id,
        email,
        name,
    })
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Triage as sent back by a caller of the reply endpoints.
///
/// Every field is optional: an unknown or missing intent reads as `other`
/// and any language other than `de` reads as `en`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReplyTriage {
    pub intent: Option<String>,
    pub urgency: Option<String>,
    pub entities: Option<Entities>,
    pub language: Option<String>,
    pub confidence: Option<f64>,
}

impl ReplyTriage {
    /// Convert into a record, re-validating the order id on the way
    pub fn into_record(self) -> TriageRecord {
        let intent = self
            .intent
            .as_deref()
            .and_then(Intent::parse)
            .unwrap_or(Intent::Other);
        let language = match self.language.as_deref() {
            Some("de") => Language::De,
            _ => Language::En,
        };

        let mut record = TriageRecord::new(intent, language, self.confidence.unwrap_or(0.0));
        record.urgency = self
            .urgency
            .as_deref()
            .and_then(Urgency::parse)
            .unwrap_or_default();
        record.entities = self.entities.unwrap_or_default();
        record.enforce_order_id();
        record
    }
}

/// Shipment status returned by the fulfillment lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusInfo {
    pub order_id: String,
    pub status: String,
    pub carrier: String,
    pub tracking: String,
    pub eta_days: u32,
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}
