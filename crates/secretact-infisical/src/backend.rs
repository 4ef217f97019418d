//! Seam between the action handlers and the secrets backend

use async_trait::async_trait;
use secretact_core::{mask_credential, mask_secret};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Machine-identity credentials used for the client-credentials login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    /// Both halves must be non-empty; anything else counts as unconfigured.
    pub fn from_parts(client_id: Option<String>, client_secret: Option<String>) -> Option<Self> {
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(Self { client_id, client_secret })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &mask_credential(&self.client_id))
            .field("client_secret", &mask_credential(&self.client_secret))
            .finish()
    }
}

/// Authenticated session, valid for the duration of one request
#[derive(Clone)]
pub struct Session {
    pub site_url: String,
    pub access_token: String,
    pub expires_in: Option<u64>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("site_url", &self.site_url)
            .field("access_token", &mask_secret(&self.access_token))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Project, environment and folder a backend call is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretScope {
    pub project_id: String,
    pub environment: String,
    pub secret_path: String,
    pub include_imports: bool,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSecret {
    pub secret_key: String,
    #[serde(default)]
    pub secret_value: String,
    #[serde(default)]
    pub version: Option<i64>,
}

impl BackendSecret {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { secret_key: key.into(), secret_value: value.into(), version: None }
    }
}

impl fmt::Debug for BackendSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSecret")
            .field("secret_key", &self.secret_key)
            .field("secret_value", &mask_secret(&self.secret_value))
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {message}")]
    Status { url: String, status: u16, message: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Operations the handlers need from a secrets manager
#[async_trait]
pub trait SecretsBackend: Send + Sync {
    /// Exchange credentials for a session against `site_url`
    async fn login(&self, site_url: &str, credentials: &Credentials) -> BackendResult<Session>;

    async fn list_secrets(
        &self,
        session: &Session,
        scope: &SecretScope,
    ) -> BackendResult<Vec<BackendSecret>>;

    async fn create_secret(
        &self,
        session: &Session,
        scope: &SecretScope,
        name: &str,
        value: &str,
    ) -> BackendResult<BackendSecret>;

    async fn update_secret(
        &self,
        session: &Session,
        scope: &SecretScope,
        name: &str,
        value: &str,
    ) -> BackendResult<BackendSecret>;

    async fn delete_secret(
        &self,
        session: &Session,
        scope: &SecretScope,
        name: &str,
    ) -> BackendResult<BackendSecret>;

    /// Backend name for logs
    fn backend_type(&self) -> &'static str;
}
