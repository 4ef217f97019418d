#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use secretact_infisical::{
    BackendError, BackendResult, BackendSecret, Credentials, SecretScope, SecretsBackend, Session,
};
use secretact_server::{restapi::create_router, AppState, ServiceConfig};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tower::ServiceExt;

/// In-memory backend counting every call
#[derive(Default)]
pub struct FakeBackend {
    pub secrets: Vec<BackendSecret>,
    pub logins: AtomicUsize,
    pub lists: AtomicUsize,
    pub writes: AtomicUsize,
}

impl FakeBackend {
    pub fn with(secrets: &[(&str, &str)]) -> Self {
        Self {
            secrets: secrets.iter().map(|(k, v)| BackendSecret::new(*k, *v)).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
            + self.lists.load(Ordering::SeqCst)
            + self.writes.load(Ordering::SeqCst)
    }

    fn written(&self, name: &str) -> BackendResult<BackendSecret> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if name == "LOCKED" {
            return Err(BackendError::Status {
                url: "https://app.infisical.com/api/v3/secrets/raw/LOCKED".into(),
                status: 403,
                message: "permission denied".into(),
            });
        }
        Ok(BackendSecret { secret_key: name.to_string(), secret_value: String::new(), version: Some(1) })
    }
}

#[async_trait]
impl SecretsBackend for FakeBackend {
    async fn login(&self, site_url: &str, _credentials: &Credentials) -> BackendResult<Session> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(Session { site_url: site_url.to_string(), access_token: "tok".into(), expires_in: None })
    }

    async fn list_secrets(
        &self,
        _session: &Session,
        _scope: &SecretScope,
    ) -> BackendResult<Vec<BackendSecret>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.secrets.clone())
    }

    async fn create_secret(
        &self,
        _session: &Session,
        _scope: &SecretScope,
        name: &str,
        _value: &str,
    ) -> BackendResult<BackendSecret> {
        self.written(name)
    }

    async fn update_secret(
        &self,
        _session: &Session,
        _scope: &SecretScope,
        name: &str,
        _value: &str,
    ) -> BackendResult<BackendSecret> {
        self.written(name)
    }

    async fn delete_secret(
        &self,
        _session: &Session,
        _scope: &SecretScope,
        name: &str,
    ) -> BackendResult<BackendSecret> {
        self.written(name)
    }

    fn backend_type(&self) -> &'static str {
        "fake"
    }
}

pub fn configured() -> ServiceConfig {
    ServiceConfig {
        client_id: Some("machine-identity-id".into()),
        client_secret: Some("machine-identity-secret".into()),
        infisical_url: Some("https://app.infisical.com".into()),
        ..Default::default()
    }
}

pub fn router(config: ServiceConfig, backend: Arc<FakeBackend>) -> Router {
    create_router(AppState::with_backend(config, backend).unwrap())
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
