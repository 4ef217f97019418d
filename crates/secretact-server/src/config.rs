//! Process configuration, read from flags or environment

use clap::Args;
use secretact_core::mask_credential;
use secretact_infisical::Credentials;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8093;

/// Service settings. Empty values count as unset.
#[derive(Clone, Args)]
pub struct ServiceConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Interface to bind
    #[arg(long = "bind-host", env = "SECRETACT_BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    /// URL advertised to the service registry
    #[arg(long = "service-url", env = "INFISICAL_SERVICE_URL")]
    pub service_url: Option<String>,

    /// API key callers must present; unset runs in development mode
    #[arg(long = "api-key", env = "INFISICAL_SERVICE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long = "client-id", env = "INFISICAL_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    #[arg(long = "client-secret", env = "INFISICAL_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Backend base URL used when an action omits `target.url`
    #[arg(long = "infisical-url", env = "INFISICAL_URL")]
    pub infisical_url: Option<String>,

    /// Service registry base URL
    #[arg(long = "registry-url", env = "REGISTRYSERVICE_API_URL")]
    pub registry_url: Option<String>,

    /// Timeout for backend HTTP calls, in seconds
    #[arg(long = "http-timeout-secs", env = "SECRETACT_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn advertised_url(&self) -> String {
        non_empty(&self.service_url)
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }

    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.api_key)
    }

    pub fn infisical_url(&self) -> Option<&str> {
        non_empty(&self.infisical_url)
    }

    pub fn registry_url(&self) -> Option<&str> {
        non_empty(&self.registry_url).map(|u| u.trim_end_matches('/'))
    }

    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(
            non_empty(&self.client_id).map(str::to_string),
            non_empty(&self.client_secret).map(str::to_string),
        )
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_host: "0.0.0.0".to_string(),
            service_url: None,
            api_key: None,
            client_id: None,
            client_secret: None,
            infisical_url: None,
            registry_url: None,
            http_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = |v: &Option<String>| mask_credential(v.as_deref().unwrap_or_default());
        f.debug_struct("ServiceConfig")
            .field("port", &self.port)
            .field("bind_host", &self.bind_host)
            .field("service_url", &self.service_url)
            .field("api_key", &masked(&self.api_key))
            .field("client_id", &masked(&self.client_id))
            .field("client_secret", &masked(&self.client_secret))
            .field("infisical_url", &self.infisical_url)
            .field("registry_url", &self.registry_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_count_as_unset() {
        let config = ServiceConfig {
            api_key: Some("  ".into()),
            client_id: Some("id".into()),
            client_secret: Some(String::new()),
            registry_url: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.api_key(), None);
        assert!(config.credentials().is_none());
        assert_eq!(config.registry_url(), None);
    }

    #[test]
    fn advertised_url_defaults_to_localhost_port() {
        let config = ServiceConfig { port: 9000, ..Default::default() };
        assert_eq!(config.advertised_url(), "http://localhost:9000");
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");

        let config = ServiceConfig {
            service_url: Some("http://infisicalservice:8093/".into()),
            ..Default::default()
        };
        assert_eq!(config.advertised_url(), "http://infisicalservice:8093");
    }

    #[test]
    fn debug_masks_secrets() {
        let config = ServiceConfig {
            client_secret: Some("super-secret-value".into()),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("supe...alue"));
    }
}
