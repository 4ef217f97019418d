//! REST convenience endpoints, each rewritten into a semantic action

use super::respond;
use crate::{middleware::RequestId, AppState};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Extension, Path, Query, State},
    response::Response,
};
use secretact_core::{
    rest::{self, CreateSecretRequest, SecretQuery, UpdateSecretRequest},
    ActionError, ActionResult,
};
use serde::de::DeserializeOwned;

fn decode<T: DeserializeOwned>(body: &[u8]) -> ActionResult<T> {
    serde_json::from_slice(body).map_err(|e| ActionError::InvalidRequest(e.to_string()))
}

fn query_params(query: Result<Query<SecretQuery>, QueryRejection>) -> ActionResult<SecretQuery> {
    query
        .map(|Query(query)| query)
        .map_err(|e| ActionError::InvalidRequest(e.body_text()))
}

/// POST /v1/api/secrets
pub async fn create_secret(
    State(app_state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Response {
    let envelope = decode::<CreateSecretRequest>(&body).and_then(|req| rest::create_action(&req));
    respond(&app_state, &request_id, envelope).await
}

/// GET /v1/api/secrets/:key
pub async fn get_secret(
    State(app_state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(key): Path<String>,
    query: Result<Query<SecretQuery>, QueryRejection>,
) -> Response {
    let envelope = query_params(query).and_then(|query| rest::search_action(&key, &query));
    respond(&app_state, &request_id, envelope).await
}

/// PUT /v1/api/secrets/:key
pub async fn update_secret(
    State(app_state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(key): Path<String>,
    body: Bytes,
) -> Response {
    let envelope =
        decode::<UpdateSecretRequest>(&body).and_then(|req| rest::update_action(&key, &req));
    respond(&app_state, &request_id, envelope).await
}

/// DELETE /v1/api/secrets/:key
pub async fn delete_secret(
    State(app_state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(key): Path<String>,
    query: Result<Query<SecretQuery>, QueryRejection>,
) -> Response {
    let envelope = query_params(query).and_then(|query| rest::delete_action(&key, &query));
    respond(&app_state, &request_id, envelope).await
}
