//! Semantic action endpoint

use super::respond;
use crate::{middleware::RequestId, AppState};
use axum::{
    body::Bytes,
    extract::{Extension, State},
    response::Response,
};
use secretact_core::parse_envelope;

/// POST /v1/api/semantic/action
pub async fn execute_action(
    State(app_state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Response {
    respond(&app_state, &request_id, parse_envelope(&body)).await
}
