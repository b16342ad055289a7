//! SupportDesk Reply
//!
//! Reply stage of the support pipeline. A [`Composer`] turns a message and
//! its triage record into customer-facing text, buffered or streamed:
//!
//! - [`TemplateComposer`]: fixed per-language templates, no model call
//! - [`GroundedComposer`]: a chat-completion model restricted to the triage
//!   record and the lookup result
//!
//! Both re-validate the order id before consulting [`FulfillmentLookup`].

pub mod composer;
pub mod fulfillment;
pub mod grounded;
pub mod templates;

pub use composer::Composer;
pub use fulfillment::{FulfillmentLookup, MockFulfillment, DEFAULT_LOOKUP_LATENCY};
pub use grounded::GroundedComposer;
pub use templates::{word_chunks, TemplateComposer, DEFAULT_STREAM_PACING};
