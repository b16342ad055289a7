//! HTTP routes and handlers

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use supportdesk_core::{Error, ReplyTriage, TriageRecord};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::error::{AppError, StreamError};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
        )
    });

    let api_routes = Router::new()
        .route("/support/triage", post(triage))
        .route("/support/reply", post(reply))
        .route("/support/reply/stream", post(reply_stream))
        .route("/debug/env", get(debug_env));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed").into_response(),
    }
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Body of `POST /api/support/triage`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TriageRequest {
    pub message: Option<String>,
}

/// Body of both reply endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplyRequest {
    pub message: Option<String>,
    pub triage: Option<ReplyTriage>,
}

impl ReplyRequest {
    /// Strict form for the buffered endpoint: a non-blank message and a
    /// triage object are required, while the triage values stay lenient.
    fn into_validated_parts(self) -> Result<(String, TriageRecord), Error> {
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::validation("message is required"))?;
        let triage = self
            .triage
            .ok_or_else(|| Error::validation("triage is required"))?;
        Ok((message, triage.into_record()))
    }

    fn into_parts(self) -> (String, TriageRecord) {
        (
            self.message.unwrap_or_default(),
            self.triage.unwrap_or_default().into_record(),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvReport {
    pub has_key: bool,
    /// First seven characters of the credential, empty when unset
    pub prefix: String,
}

fn record_request(endpoint: &'static str) {
    metrics::counter!("supportdesk_requests_total", "endpoint" => endpoint).increment(1);
}

fn record_error(endpoint: &'static str, err: &Error) {
    warn!("{} failed: {}", endpoint, err);
    metrics::counter!(
        "supportdesk_errors_total",
        "endpoint" => endpoint,
        "kind" => err.kind()
    )
    .increment(1);
}

fn record_latency(stage: &'static str, start: Instant) {
    metrics::histogram!("supportdesk_stage_latency_us", "stage" => stage)
        .record(start.elapsed().as_micros() as f64);
}

async fn triage(
    State(state): State<AppState>,
    payload: Result<Json<TriageRequest>, JsonRejection>,
) -> Result<Json<TriageRecord>, AppError> {
    record_request("triage");

    let result = async {
        let Json(req) = payload.map_err(|e| Error::validation(e.body_text()))?;
        let message = req.message.unwrap_or_default();
        info!("Triage request ({} bytes)", message.len());

        let start = Instant::now();
        let record = state.assembler.assemble(&message).await?;
        record_latency("triage", start);
        Ok::<_, Error>(record)
    }
    .await;

    result.map(Json).map_err(|e| {
        record_error("triage", &e);
        AppError(e)
    })
}

async fn reply(
    State(state): State<AppState>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> Result<Json<ReplyResponse>, AppError> {
    record_request("reply");

    let result = async {
        let Json(req) = payload.map_err(|e| Error::validation(e.body_text()))?;
        let (message, triage) = req.into_validated_parts()?;
        info!(
            "Reply request: intent={}, language={} ({} bytes)",
            triage.intent,
            triage.language,
            message.len()
        );

        let start = Instant::now();
        let reply = state.composer.compose(&message, &triage).await?;
        record_latency("reply", start);
        Ok::<_, Error>(reply)
    }
    .await;

    result
        .map(|reply| Json(ReplyResponse { reply }))
        .map_err(|e| {
            record_error("reply", &e);
            AppError(e)
        })
}

async fn reply_stream(
    State(state): State<AppState>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> Result<Response, StreamError> {
    record_request("reply_stream");

    let result = async {
        let Json(req) = payload.map_err(|e| Error::validation(e.body_text()))?;
        let (message, triage) = req.into_parts();
        info!(
            "Streaming reply request: intent={}, language={} ({} bytes)",
            triage.intent,
            triage.language,
            message.len()
        );
        state.composer.compose_stream(&message, &triage).await
    }
    .await;

    let tokens = result.map_err(|e| {
        record_error("reply_stream", &e);
        StreamError(e)
    })?;

    let start = Instant::now();
    let mut first_chunk = true;
    let body = tokens.inspect(move |item| {
        if let Err(e) = item {
            record_error("reply_stream", e);
        }
        if first_chunk {
            first_chunk = false;
            record_latency("reply_stream_first_chunk", start);
        }
    });

    let mut response = Response::new(Body::from_stream(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    Ok(response)
}

async fn debug_env(State(state): State<AppState>) -> Json<EnvReport> {
    Json(EnvReport {
        has_key: state.settings.has_api_key(),
        prefix: state.settings.api_key_prefix().unwrap_or_default(),
    })
}
