//! Service-registry client
//!
//! The service announces itself to the registry on start and withdraws on
//! shutdown. Registration failures are logged; the service keeps running
//! without a registry.

use crate::{
    config::ServiceConfig, ServerError, ServerResult, API_VERSION, CAPABILITIES,
    SERVICE_DESCRIPTION, SERVICE_ID, SERVICE_NAME,
};
use secretact_registry::{ActionCapability, ActionRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const SERVICES_PATH: &str = "/v1/api/services";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVersionInfo {
    pub version: String,
    pub url: String,
    pub documentation: String,
    pub is_default: bool,
    pub status: String,
    pub capabilities: Vec<String>,
}

/// Body of `POST /v1/api/services`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRegistration {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub port: u16,
    pub version: String,
    pub capabilities: Vec<String>,
    pub action_capabilities: Vec<ActionCapability>,
    pub api_versions: Vec<ApiVersionInfo>,
}

impl ServiceRegistration {
    pub fn new(config: &ServiceConfig, registry: &ActionRegistry) -> Self {
        let url = config.advertised_url();
        let capabilities: Vec<String> = CAPABILITIES.iter().map(|c| c.to_string()).collect();
        Self {
            id: SERVICE_ID.to_string(),
            name: SERVICE_NAME.to_string(),
            description: SERVICE_DESCRIPTION.to_string(),
            port: config.port,
            version: API_VERSION.to_string(),
            capabilities: capabilities.clone(),
            action_capabilities: registry.capabilities(),
            api_versions: vec![ApiVersionInfo {
                version: API_VERSION.to_string(),
                url: format!("{}/{}", url, API_VERSION),
                documentation: format!("{}/v1/api/docs", url),
                is_default: true,
                status: "stable".to_string(),
                capabilities,
            }],
            url,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> ServerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn register(&self, registration: &ServiceRegistration) -> ServerResult<()> {
        let url = format!("{}{}", self.base_url, SERVICES_PATH);
        let response = self
            .http
            .post(&url)
            .json(registration)
            .send()
            .await
            .map_err(|e| ServerError::Discovery(format!("POST {} failed: {}", url, e)))?;
        Self::check(&url, response).await
    }

    pub async fn deregister(&self, service_id: &str) -> ServerResult<()> {
        let url = format!("{}{}/{}", self.base_url, SERVICES_PATH, urlencoding::encode(service_id));
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| ServerError::Discovery(format!("DELETE {} failed: {}", url, e)))?;
        Self::check(&url, response).await
    }

    async fn check(url: &str, response: reqwest::Response) -> ServerResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ServerError::Discovery(format!("{} returned {}: {}", url, status, body)))
    }
}

/// Live registration, withdrawn by [`release`](Self::release) or on drop
pub struct RegistrationGuard {
    client: RegistryClient,
    service_id: String,
    released: bool,
}

impl RegistrationGuard {
    pub async fn register(
        client: RegistryClient,
        registration: &ServiceRegistration,
    ) -> ServerResult<Self> {
        client.register(registration).await?;
        info!(registry = %client.base_url(), service_id = %registration.id, "registered with service registry");
        Ok(Self { client, service_id: registration.id.clone(), released: false })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Deregister now. Failures are logged, never returned.
    pub async fn release(mut self) {
        self.released = true;
        match self.client.deregister(&self.service_id).await {
            Ok(()) => info!(service_id = %self.service_id, "deregistered from service registry"),
            Err(e) => error!(service_id = %self.service_id, error = %e, "failed to deregister"),
        }
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let client = self.client.clone();
        let service_id = std::mem::take(&mut self.service_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = client.deregister(&service_id).await {
                        error!(service_id = %service_id, error = %e, "failed to deregister");
                    }
                });
            }
            Err(_) => warn!(service_id = %service_id, "no runtime left to deregister from service registry"),
        }
    }
}

/// Registration slot shared between the shutdown signal and the serve loop.
///
/// Whichever side calls [`release`](Self::release) first deregisters; later
/// calls are no-ops.
#[derive(Clone, Default)]
pub struct SharedRegistration(Arc<Mutex<Option<RegistrationGuard>>>);

impl SharedRegistration {
    pub fn new(guard: Option<RegistrationGuard>) -> Self {
        Self(Arc::new(Mutex::new(guard)))
    }

    pub async fn release(&self) {
        let guard = self.0.lock().await.take();
        if let Some(guard) = guard {
            guard.release().await;
        }
    }
}

/// Register with the configured service registry, if any.
///
/// Returns `None` when no registry is configured or registration failed.
pub async fn register_service(
    config: &ServiceConfig,
    registry: &ActionRegistry,
) -> Option<RegistrationGuard> {
    let base_url = config.registry_url()?;
    let client = match RegistryClient::new(base_url, config.http_timeout()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to register with registry");
            return None;
        }
    };
    let registration = ServiceRegistration::new(config, registry);
    match RegistrationGuard::register(client, &registration).await {
        Ok(guard) => Some(guard),
        Err(e) => {
            error!(error = %e, "failed to register with registry");
            None
        }
    }
}
