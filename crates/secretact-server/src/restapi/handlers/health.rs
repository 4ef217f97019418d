//! Health check handlers

use crate::{dto::HealthStatus, SERVICE_ID};
use axum::response::Json;

/// GET /health
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        service: SERVICE_ID,
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
