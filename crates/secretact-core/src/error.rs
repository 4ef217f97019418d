//! Error taxonomy shared by every stage of the action pipeline

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

/// Boxed cause carried by backend-facing errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type ActionResult<T> = Result<T, ActionError>;

#[derive(Debug, Error)]
pub enum ActionError {
    /// Malformed body or missing `@type`/`type` discriminator
    #[error("failed to parse action: {0}")]
    Parse(String),

    /// REST payload rejected before an envelope could be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{field} is required")]
    Validation { field: String },

    #[error("unsupported action type: {kind}. Supported types: {}", .supported.join(", "))]
    UnsupportedAction { kind: String, supported: Vec<String> },

    /// Process-level settings (credentials, backend url) are missing
    #[error("{0}")]
    Configuration(String),

    #[error("authentication failed: {source}")]
    Authentication { source: BoxError },

    #[error("failed to retrieve secrets: {source}")]
    Retrieval { source: BoxError },

    #[error("failed to {operation} secret: {source}")]
    Backend { operation: &'static str, source: BoxError },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ActionError {
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation { field: field.into() }
    }

    pub fn authentication(source: impl Into<BoxError>) -> Self {
        Self::Authentication { source: source.into() }
    }

    pub fn retrieval(source: impl Into<BoxError>) -> Self {
        Self::Retrieval { source: source.into() }
    }

    pub fn backend(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Backend { operation, source: source.into() }
    }

    /// Stable machine-readable code used in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::Parse(_) => "PARSE_ERROR",
            ActionError::InvalidRequest(_) => "INVALID_REQUEST",
            ActionError::Validation { .. } => "VALIDATION_ERROR",
            ActionError::UnsupportedAction { .. } => "UNSUPPORTED_ACTION",
            ActionError::Configuration(_) => "CONFIGURATION_ERROR",
            ActionError::Authentication { .. } => "AUTHENTICATION_ERROR",
            ActionError::Retrieval { .. } => "RETRIEVAL_ERROR",
            ActionError::Backend { .. } => "BACKEND_ERROR",
            ActionError::Internal(_) => "INTERNAL",
        }
    }

    /// Caller-input errors; everything else is a backend or configuration fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ActionError::Parse(_)
                | ActionError::InvalidRequest(_)
                | ActionError::Validation { .. }
                | ActionError::UnsupportedAction { .. }
        )
    }

    /// Text of the wrapped backend error, if any
    pub fn cause(&self) -> Option<String> {
        match self {
            ActionError::Authentication { source }
            | ActionError::Retrieval { source }
            | ActionError::Backend { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<JsonValue> {
        match self {
            ActionError::Validation { field } => Some(json!({ "field": field })),
            ActionError::UnsupportedAction { supported, .. } => {
                Some(json!({ "supportedTypes": supported }))
            }
            _ => None,
        }
    }
}
