//! REST API handlers

pub mod docs;
pub mod health;
pub mod secrets;
pub mod semantic;

use crate::{middleware::RequestId, AppState, ServerError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use secretact_core::{mask_json_value, ActionEnvelope, ActionResult};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Dispatch a decoded envelope and render it in the caller's shape.
///
/// Failures before an envelope exists answer with an error body; afterwards
/// the envelope itself, with `error` set, is the response.
pub(crate) async fn respond(
    state: &AppState,
    request_id: &RequestId,
    decoded: ActionResult<ActionEnvelope>,
) -> Response {
    let mut envelope = match decoded {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(request_id = %request_id.as_str(), code = err.code(), error = %err, "rejected action request");
            return ServerError::from(err).to_http_response(request_id.0.clone()).into_response();
        }
    };

    if tracing::enabled!(tracing::Level::DEBUG) {
        if let Ok(doc) = serde_json::to_value(&envelope) {
            debug!(request_id = %request_id.as_str(), action = %mask_json_value(&doc), "received action");
        }
    }

    let started = Instant::now();
    let status = match state.registry.dispatch(&mut envelope).await {
        Ok(()) => StatusCode::OK,
        Err(err) => ServerError::from(err).status_code(),
    };
    info!(
        request_id = %request_id.as_str(),
        action_type = %envelope.kind(),
        status = status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "action finished"
    );

    (status, Json(envelope)).into_response()
}
