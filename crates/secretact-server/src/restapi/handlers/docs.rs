//! Service documentation

use crate::{
    dto::{EndpointDoc, ServiceDoc},
    AppState, API_VERSION, CAPABILITIES, SERVICE_DESCRIPTION, SERVICE_ID, SERVICE_NAME,
};
use axum::{extract::State, response::Json};

fn endpoints() -> Vec<EndpointDoc> {
    let doc = |method, path, description| EndpointDoc { method, path, description };
    vec![
        doc(
            "POST",
            "/v1/api/semantic/action",
            "Execute secrets management operations via semantic actions (primary interface)",
        ),
        doc("POST", "/v1/api/secrets", "Create secret (converted to CreateAction)"),
        doc("GET", "/v1/api/secrets/:key", "Retrieve secret (converted to SearchAction)"),
        doc("PUT", "/v1/api/secrets/:key", "Update secret (converted to UpdateAction)"),
        doc("DELETE", "/v1/api/secrets/:key", "Delete secret (converted to DeleteAction)"),
        doc("GET", "/health", "Health check endpoint"),
        doc("GET", "/v1/api/docs", "This document"),
    ]
}

/// GET /v1/api/docs
pub async fn service_docs(State(app_state): State<AppState>) -> Json<ServiceDoc> {
    Json(ServiceDoc {
        service_id: SERVICE_ID,
        service_name: SERVICE_NAME,
        description: SERVICE_DESCRIPTION,
        version: API_VERSION,
        port: app_state.config.port,
        capabilities: CAPABILITIES.to_vec(),
        endpoints: endpoints(),
        supported_actions: app_state.registry.supported_types(),
        action_capabilities: app_state.registry.capabilities(),
    })
}
