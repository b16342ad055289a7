//! SupportDesk Triage
//!
//! Classification stage of the support pipeline:
//!
//! ```text
//! message -> PiiRedactor -> Classifier (heuristic | llm) -> order-id post-processing -> TriageRecord
//! ```
//!
//! The classifier strategy is chosen once at startup. Whatever it returns,
//! the [`TriageAssembler`] re-validates the order id with
//! [`supportdesk_core::validate_order_id`] and clears it for every intent
//! other than `order_status`.

pub mod assembler;
pub mod classifier;
pub mod delegated;
pub mod heuristic;
pub mod pii;

pub use assembler::TriageAssembler;
pub use classifier::Classifier;
pub use delegated::{triage_response_format, LlmClassifier};
pub use heuristic::{HeuristicClassifier, KeywordDetector, HEURISTIC_CONFIDENCE};
pub use pii::PiiRedactor;
