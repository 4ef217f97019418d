use async_trait::async_trait;
use secretact_core::{
    parse_envelope, ActionEnvelope, ActionError, ActionOutcome, ActionStatus, SecretEntry,
};
use secretact_infisical::{
    register_secret_handlers, BackendError, BackendResult, BackendSecret, Credentials,
    SecretScope, SecretsBackend, SecretsContext, Session,
};
use secretact_registry::ActionRegistry;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

#[derive(Default)]
struct SpyBackend {
    secrets: Vec<BackendSecret>,
    reject_login: bool,
    fail_list: bool,
    logins: AtomicUsize,
    lists: AtomicUsize,
    writes: AtomicUsize,
    last_site: Mutex<Option<String>>,
    last_scope: Mutex<Option<SecretScope>>,
}

impl SpyBackend {
    fn with_secrets(secrets: Vec<BackendSecret>) -> Self {
        Self { secrets, ..Default::default() }
    }

    fn calls(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
            + self.lists.load(Ordering::SeqCst)
            + self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self, scope: &SecretScope, name: &str) -> BackendResult<BackendSecret> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last_scope.lock().unwrap() = Some(scope.clone());
        Ok(BackendSecret { secret_key: name.to_string(), secret_value: String::new(), version: Some(2) })
    }
}

#[async_trait]
impl SecretsBackend for SpyBackend {
    async fn login(&self, site_url: &str, credentials: &Credentials) -> BackendResult<Session> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        *self.last_site.lock().unwrap() = Some(site_url.to_string());
        if self.reject_login {
            return Err(BackendError::Status {
                url: format!("{site_url}/api/v1/auth/universal-auth/login"),
                status: 401,
                message: "invalid client secret".into(),
            });
        }
        Ok(Session {
            site_url: site_url.to_string(),
            access_token: format!("token-for-{}", credentials.client_id),
            expires_in: Some(7200),
        })
    }

    async fn list_secrets(
        &self,
        _session: &Session,
        scope: &SecretScope,
    ) -> BackendResult<Vec<BackendSecret>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        *self.last_scope.lock().unwrap() = Some(scope.clone());
        if self.fail_list {
            return Err(BackendError::Status {
                url: "https://app.infisical.com/api/v3/secrets/raw".into(),
                status: 404,
                message: "environment not found".into(),
            });
        }
        Ok(self.secrets.clone())
    }

    async fn create_secret(
        &self,
        _session: &Session,
        scope: &SecretScope,
        name: &str,
        _value: &str,
    ) -> BackendResult<BackendSecret> {
        self.record_write(scope, name)
    }

    async fn update_secret(
        &self,
        _session: &Session,
        scope: &SecretScope,
        name: &str,
        _value: &str,
    ) -> BackendResult<BackendSecret> {
        self.record_write(scope, name)
    }

    async fn delete_secret(
        &self,
        _session: &Session,
        scope: &SecretScope,
        name: &str,
    ) -> BackendResult<BackendSecret> {
        self.record_write(scope, name)
    }

    fn backend_type(&self) -> &'static str {
        "spy"
    }
}

fn credentials() -> Option<Credentials> {
    Credentials::from_parts(Some("machine-identity-id".into()), Some("machine-identity-secret".into()))
}

fn registry(backend: Arc<SpyBackend>, credentials: Option<Credentials>, default_url: Option<&str>) -> ActionRegistry {
    let ctx = Arc::new(SecretsContext::new(backend, credentials, default_url.map(str::to_string)));
    let mut registry = ActionRegistry::new();
    register_secret_handlers(&mut registry, ctx).unwrap();
    registry
}

fn envelope(doc: Value) -> ActionEnvelope {
    parse_envelope(doc.to_string().as_bytes()).unwrap()
}

fn retrieve_doc() -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "RetrieveAction",
        "target": {
            "url": "https://app.infisical.com",
            "identifier": "p1",
            "environment": "prod",
            "secretPath": "/backend",
            "includeImports": true
        }
    })
}

fn db_password() -> Vec<BackendSecret> {
    vec![BackendSecret::new("DB_PASSWORD", "s3cr3t123"), BackendSecret::new("DB_USER", "app")]
}

#[tokio::test]
async fn retrieve_writes_name_value_pairs() {
    let backend = Arc::new(SpyBackend::with_secrets(db_password()));
    let registry = registry(backend.clone(), credentials(), None);
    let mut env = envelope(retrieve_doc());

    registry.dispatch(&mut env).await.unwrap();

    assert_eq!(env.status(), ActionStatus::Completed);
    assert_eq!(
        env.result(),
        Some(&ActionOutcome::Secrets(vec![
            SecretEntry::new("DB_PASSWORD", "s3cr3t123"),
            SecretEntry::new("DB_USER", "app"),
        ]))
    );
    let scope = backend.last_scope.lock().unwrap().clone().unwrap();
    assert_eq!(
        scope,
        SecretScope {
            project_id: "p1".into(),
            environment: "prod".into(),
            secret_path: "/backend".into(),
            include_imports: true,
        }
    );
}

#[tokio::test]
async fn missing_target_fields_never_reach_the_backend() {
    for (field, expected) in [
        ("url", "target.url"),
        ("identifier", "target.identifier"),
        ("environment", "target.environment"),
    ] {
        let backend = Arc::new(SpyBackend::with_secrets(db_password()));
        let registry = registry(backend.clone(), credentials(), None);
        let mut doc = retrieve_doc();
        doc["target"].as_object_mut().unwrap().remove(field);
        let mut env = envelope(doc);

        let err = registry.dispatch(&mut env).await.unwrap_err();

        match err {
            ActionError::Validation { field } => assert_eq!(field, expected),
            other => panic!("unexpected error for {expected}: {other}"),
        }
        assert_eq!(env.status(), ActionStatus::Failed);
        assert_eq!(backend.calls(), 0, "{expected} must be validated before any backend call");
    }
}

#[tokio::test]
async fn missing_target_is_a_validation_error() {
    let backend = Arc::new(SpyBackend::default());
    let registry = registry(backend.clone(), credentials(), Some("https://app.infisical.com"));
    let mut env = envelope(json!({"@type": "RetrieveAction"}));

    let err = registry.dispatch(&mut env).await.unwrap_err();

    assert!(matches!(err, ActionError::Validation { ref field } if field == "target"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn missing_credentials_fail_before_login() {
    let backend = Arc::new(SpyBackend::with_secrets(db_password()));
    let partial = Credentials::from_parts(Some("machine-identity-id".into()), Some(String::new()));
    assert!(partial.is_none());
    let registry = registry(backend.clone(), partial, None);
    let mut env = envelope(retrieve_doc());

    let err = registry.dispatch(&mut env).await.unwrap_err();

    assert!(matches!(err, ActionError::Configuration(_)));
    assert!(err.to_string().contains("credentials not configured"));
    assert_eq!(backend.logins.load(Ordering::SeqCst), 0);
    assert_eq!(env.error().unwrap().code, "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn rejected_login_is_an_authentication_error() {
    let backend = Arc::new(SpyBackend { reject_login: true, ..Default::default() });
    let registry = registry(backend.clone(), credentials(), None);
    let mut env = envelope(retrieve_doc());

    let err = registry.dispatch(&mut env).await.unwrap_err();

    assert!(matches!(err, ActionError::Authentication { .. }));
    assert_eq!(backend.lists.load(Ordering::SeqCst), 0);
    let failure = env.error().unwrap();
    assert!(failure.cause.as_deref().unwrap().contains("invalid client secret"));
}

#[tokio::test]
async fn listing_failure_is_a_retrieval_error() {
    let backend = Arc::new(SpyBackend { fail_list: true, ..Default::default() });
    let registry = registry(backend.clone(), credentials(), None);
    let mut env = envelope(retrieve_doc());

    let err = registry.dispatch(&mut env).await.unwrap_err();

    assert!(matches!(err, ActionError::Retrieval { .. }));
    assert!(env.result().is_none());
}

#[tokio::test]
async fn configured_url_fills_in_for_missing_target_url() {
    let backend = Arc::new(SpyBackend::with_secrets(db_password()));
    let registry = registry(backend.clone(), credentials(), Some("eu.infisical.com/"));
    let mut doc = retrieve_doc();
    doc["target"].as_object_mut().unwrap().remove("url");
    let mut env = envelope(doc);

    registry.dispatch(&mut env).await.unwrap();

    assert_eq!(backend.last_site.lock().unwrap().as_deref(), Some("https://eu.infisical.com"));
}

#[tokio::test]
async fn search_filters_by_query() {
    let backend = Arc::new(SpyBackend::with_secrets(db_password()));
    let registry = registry(backend, credentials(), Some("https://app.infisical.com"));
    let mut env = envelope(json!({
        "@type": "SearchAction",
        "query": "DB_PASSWORD",
        "target": {"actionPlatform": "p1", "actionApplication": "prod"}
    }));

    registry.dispatch(&mut env).await.unwrap();

    assert_eq!(
        env.result(),
        Some(&ActionOutcome::Secrets(vec![SecretEntry::new("DB_PASSWORD", "s3cr3t123")]))
    );
}

#[tokio::test]
async fn create_requires_a_value_before_any_backend_call() {
    let backend = Arc::new(SpyBackend::default());
    let registry = registry(backend.clone(), credentials(), Some("https://app.infisical.com"));
    let mut env = envelope(json!({
        "@type": "CreateAction",
        "object": {"identifier": "API_KEY"},
        "target": {"identifier": "p1", "environment": "dev"}
    }));

    let err = registry.dispatch(&mut env).await.unwrap_err();

    assert!(matches!(err, ActionError::Validation { ref field } if field == "object.value"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn create_update_delete_report_the_written_secret() {
    for kind in ["CreateAction", "UpdateAction", "DeleteAction"] {
        let backend = Arc::new(SpyBackend::default());
        let registry = registry(backend.clone(), credentials(), Some("https://app.infisical.com"));
        let mut env = envelope(json!({
            "type": kind,
            "object": {"identifier": "API_KEY", "value": "abcdefghij"},
            "target": {"identifier": "p1", "environment": "dev"}
        }));

        registry.dispatch(&mut env).await.unwrap();

        assert_eq!(backend.writes.load(Ordering::SeqCst), 1, "{kind}");
        match env.result() {
            Some(ActionOutcome::Structured { value, .. }) => {
                assert_eq!(value["identifier"], "API_KEY");
                assert_eq!(value["secretPath"], "/");
                assert_eq!(value["version"], 2);
            }
            other => panic!("unexpected result for {kind}: {other:?}"),
        }
    }
}

#[tokio::test]
async fn retrieval_is_idempotent() {
    let backend = Arc::new(SpyBackend::with_secrets(db_password()));
    let registry = registry(backend.clone(), credentials(), None);
    let mut first = envelope(retrieve_doc());
    let mut second = envelope(retrieve_doc());

    registry.dispatch(&mut first).await.unwrap();
    registry.dispatch(&mut second).await.unwrap();

    assert_eq!(first.result(), second.result());
    assert_eq!(backend.lists.load(Ordering::SeqCst), 2);
}
