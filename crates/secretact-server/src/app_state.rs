//! Application state shared by all routes

use crate::config::ServiceConfig;
use secretact_infisical::{register_secret_handlers, InfisicalClient, SecretsBackend, SecretsContext};
use secretact_registry::ActionRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ActionRegistry>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(registry: ActionRegistry, config: ServiceConfig) -> Self {
        Self { registry: Arc::new(registry), config: Arc::new(config) }
    }

    /// Build state talking to the real Infisical API
    pub fn from_config(config: ServiceConfig) -> anyhow::Result<Self> {
        let client = InfisicalClient::new(config.http_timeout())?;
        Self::with_backend(config, Arc::new(client))
    }

    /// Build state around any backend, registering all secret handlers
    pub fn with_backend(
        config: ServiceConfig,
        backend: Arc<dyn SecretsBackend>,
    ) -> anyhow::Result<Self> {
        let ctx = Arc::new(SecretsContext::new(
            backend,
            config.credentials(),
            config.infisical_url().map(str::to_string),
        ));
        let mut registry = ActionRegistry::new();
        register_secret_handlers(&mut registry, ctx)?;
        Ok(Self::new(registry, config))
    }
}
