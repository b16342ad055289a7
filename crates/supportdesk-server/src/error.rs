//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use supportdesk_core::Error;

/// Failure of a JSON endpoint
#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        status_for(&self.0)
    }
}

/// HTTP status for a pipeline error
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.0 {
            Error::Validation(detail) => json!({ "error": "Invalid request", "details": detail }),
            Error::Schema(issues) => {
                json!({ "error": "Schema validation failed", "issues": issues })
            }
            Error::Upstream { body, .. } => json!({ "error": "OpenAI error", "details": body }),
            Error::MissingCredential(name) => json!({ "error": format!("Missing {}", name) }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Failure of the streaming endpoint, rendered as plain text
#[derive(Debug)]
pub struct StreamError(pub Error);

impl From<Error> for StreamError {
    fn from(err: Error) -> Self {
        StreamError(err)
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let text = match self.0 {
            Error::Upstream { body, .. } => format!("OpenAI error: {}", body),
            other => other.to_string(),
        };
        (status, text).into_response()
    }
}
