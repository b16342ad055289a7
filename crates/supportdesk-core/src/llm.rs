//! Chat-completion capability
//!
//! The language model is an opaque collaborator reached through one
//! request/response contract. [`OpenAiClient`] speaks it over HTTP; tests
//! and alternative backends implement [`ChatCompletion`] directly.

use crate::sse::{SseTokenStream, TokenStream};
use crate::types::ChatMessage;
use crate::{Error, Result, API_KEY_VAR};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Request body of the chat-completion contract
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Structured-output constraint (e.g. a strict JSON schema)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, temperature: f32, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            temperature,
            messages,
            stream: None,
            response_format: None,
        }
    }

    /// Attach a `response_format` constraint
    pub fn with_response_format(mut self, format: serde_json::Value) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// Trait for chat-completion backends
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Fail fast when the backend cannot be called at all (e.g. no credential)
    fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Buffered completion, returning the first choice's message content.
    ///
    /// A response without content yields an empty string; callers decide
    /// whether that is a failure.
    async fn complete(&self, request: ChatCompletionRequest) -> Result<String>;

    /// Streamed completion, yielding content deltas as they arrive
    async fn stream(&self, request: ChatCompletionRequest) -> Result<TokenStream>;
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// A missing `api_key` is not an error here; every call fails with
    /// [`Error::MissingCredential`] instead.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(Error::MissingCredential(API_KEY_VAR))
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            "POST {} (model: {}, stream: {:?})",
            url, request.model, request.stream
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Chat completion request failed: {}", status);
            return Err(Error::upstream(status.as_u16(), body));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    fn ensure_ready(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn complete(&self, mut request: ChatCompletionRequest) -> Result<String> {
        request.stream = None;
        let response = self.send(&request).await?;
        let body: CompletionResponse = response.json().await?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    async fn stream(&self, mut request: ChatCompletionRequest) -> Result<TokenStream> {
        request.stream = Some(true);
        let response = self.send(&request).await?;
        Ok(Box::pin(SseTokenStream::new(response.bytes_stream())))
    }
}

// =============================================================================
// Response structures
// =============================================================================

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}
