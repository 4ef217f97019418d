//! Server error types

use axum::{http::StatusCode, response::Json};
use secretact_core::ActionError;
use serde::Serialize;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("Service registry error: {0}")]
    Discovery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub metadata: super::dto::ResponseMeta,
}

#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Action(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::Action(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Discovery(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_http_response(&self, request_id: String) -> (StatusCode, Json<ErrorResponse>) {
        let (code, message, details) = match self {
            ServerError::Unauthorized(msg) => ("UNAUTHORIZED", msg.clone(), None),
            ServerError::Action(e) => (e.code(), e.to_string(), e.details()),
            ServerError::Discovery(msg) => ("UPSTREAM_ERROR", msg.clone(), None),
            ServerError::Internal(msg) => ("INTERNAL", msg.clone(), None),
        };

        let response = ErrorResponse {
            success: false,
            error: ErrorDetails { code: code.to_string(), message, details },
            metadata: super::dto::ResponseMeta { request_id },
        };

        (self.status_code(), Json(response))
    }
}
