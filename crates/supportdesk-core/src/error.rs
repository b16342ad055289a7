//! Error types for SupportDesk

use serde::Serialize;
use std::fmt;

/// Result type alias using SupportDesk's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Name of the credential the delegated mode requires
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Core error type for SupportDesk operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing caller input
    #[error("validation error: {0}")]
    Validation(String),

    /// A structured record did not conform to the triage schema
    #[error("schema validation failed: {}", format_issues(.0))]
    Schema(Vec<SchemaIssue>),

    /// The external chat-completion capability answered with a non-success status
    #[error("upstream error ({status}): {body}")]
    Upstream {
        /// HTTP status returned by the upstream
        status: u16,
        /// Raw response body, kept for diagnostics
        body: String,
    },

    /// The upstream answered successfully but without message content
    #[error("upstream returned no content")]
    EmptyCompletion,

    /// Delegated mode was selected without a credential
    #[error("Missing {0}")]
    MissingCredential(&'static str),

    /// Network failure talking to the upstream
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new upstream error
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Schema(_) => "schema",
            Self::Upstream { .. } => "upstream",
            Self::EmptyCompletion => "empty_completion",
            Self::MissingCredential(_) => "missing_credential",
            Self::Transport(_) => "transport",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A single field-level schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// Dotted path of the offending field (e.g. `entities.email`)
    pub path: String,

    /// Human readable description
    pub message: String,
}

impl SchemaIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn format_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_names_variable() {
        let err = Error::MissingCredential(API_KEY_VAR);
        assert_eq!(err.to_string(), "Missing OPENAI_API_KEY");
        assert_eq!(err.kind(), "missing_credential");
    }

    #[test]
    fn test_schema_error_lists_every_issue() {
        let err = Error::Schema(vec![
            SchemaIssue::new("intent", "unknown variant"),
            SchemaIssue::new("confidence", "must be within [0, 1]"),
        ]);
        let text = err.to_string();
        assert!(text.contains("intent: unknown variant"));
        assert!(text.contains("confidence: must be within [0, 1]"));
    }
}
