//! SupportDesk Server
//!
//! Axum service in front of the triage and reply pipeline:
//!
//! - `POST /api/support/triage`: message in, validated triage record out
//! - `POST /api/support/reply`: buffered reply
//! - `POST /api/support/reply/stream`: plain-text incremental reply
//! - `GET /api/debug/env`, `GET /health`, `GET /metrics`

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Settings;
pub use error::{AppError, StreamError};
pub use routes::create_router;
pub use state::AppState;
