//! SupportDesk Core
//!
//! Core types, traits, and utilities shared across SupportDesk components.
//!
//! This crate provides:
//! - The validated triage record and its schema checks
//! - The shared order-id validator every stage re-runs
//! - Error types and result handling
//! - The chat-completion client and its SSE token stream

pub mod error;
pub mod llm;
pub mod order_id;
pub mod sse;
pub mod types;

pub use error::{Error, Result, SchemaIssue, API_KEY_VAR};
pub use llm::{ChatCompletion, ChatCompletionRequest, OpenAiClient};
pub use order_id::{validate_order_id, OrderIdExtractor};
pub use sse::{parse_sse_line, ParsedChunk, SseTokenStream, TokenStream};
pub use types::{
    ChatMessage, Entities, Intent, Language, OrderStatusInfo, ReplyTriage, TriageRecord, Urgency,
};
