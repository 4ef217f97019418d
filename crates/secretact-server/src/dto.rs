//! REST API DTOs

use secretact_registry::ActionCapability;
use serde::Serialize;

/// Response metadata attached to error bodies
#[derive(Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
}

/// `GET /health`
#[derive(Serialize)]
pub struct HealthStatus {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct EndpointDoc {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// `GET /v1/api/docs`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDoc {
    pub service_id: &'static str,
    pub service_name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub port: u16,
    pub capabilities: Vec<&'static str>,
    pub endpoints: Vec<EndpointDoc>,
    pub supported_actions: Vec<String>,
    pub action_capabilities: Vec<ActionCapability>,
}
