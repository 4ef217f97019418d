//! REST API router

use super::handlers::{docs, health, secrets, semantic};
use crate::{
    middleware::{ApiKeyLayer, RequestIdLayer},
    AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

/// Create REST API router
pub fn create_router(app_state: AppState) -> Router {
    let actions = Router::new()
        .route("/v1/api/semantic/action", post(semantic::execute_action))
        .route("/v1/api/secrets", post(secrets::create_secret))
        .route(
            "/v1/api/secrets/:key",
            get(secrets::get_secret)
                .put(secrets::update_secret)
                .delete(secrets::delete_secret),
        )
        .route_layer(ApiKeyLayer::new(app_state.config.api_key()));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/v1/api/docs", get(docs::service_docs))
        .merge(actions)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::new())
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(RequestIdLayer),
        )
        .with_state(app_state)
}
