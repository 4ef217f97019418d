//! Secret action handlers
//!
//! Every handler walks the same phases: validate the envelope and process
//! configuration, authenticate against the backend, then perform its
//! operation. A failure in any phase ends the action; nothing is retried.

use crate::backend::{BackendSecret, Credentials, SecretScope, SecretsBackend, Session};
use crate::site::normalize_site_url;
use async_trait::async_trait;
use secretact_core::{
    mask_secret, ActionEnvelope, ActionError, ActionKind, ActionOutcome, ActionResult,
    ResultSchema, SecretEntry, TargetField,
};
use secretact_registry::{ActionHandler, ActionRegistry, RegistryResult};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_SECRET_PATH: &str = "/";

/// Phase an action was in when it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerPhase {
    Validating,
    Authenticating,
    Retrieving,
    Writing,
}

impl fmt::Display for HandlerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerPhase::Validating => "validating",
            HandlerPhase::Authenticating => "authenticating",
            HandlerPhase::Retrieving => "retrieving",
            HandlerPhase::Writing => "writing",
        };
        f.write_str(name)
    }
}

fn failed_in(phase: HandlerPhase, kind: &ActionKind, err: ActionError) -> ActionError {
    warn!(action_type = %kind, %phase, error = %err, "secret action failed");
    err
}

/// Backend location and scope resolved from an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub site_url: String,
    pub scope: SecretScope,
}

/// Process-level dependencies shared by all secret handlers
pub struct SecretsContext {
    backend: Arc<dyn SecretsBackend>,
    credentials: Option<Credentials>,
    default_url: Option<String>,
}

impl SecretsContext {
    pub fn new(
        backend: Arc<dyn SecretsBackend>,
        credentials: Option<Credentials>,
        default_url: Option<String>,
    ) -> Self {
        let default_url = default_url.filter(|u| !u.trim().is_empty());
        Self { backend, credentials, default_url }
    }

    /// Check the target fields, falling back to the configured backend url.
    pub fn resolve_target(&self, envelope: &ActionEnvelope) -> ActionResult<ResolvedTarget> {
        let target = envelope.require_target()?;
        let project_id = target.require(TargetField::Identifier)?;
        let environment = target.require(TargetField::Environment)?;
        let url = match target.get(TargetField::Url) {
            Some(url) => url,
            None => self
                .default_url
                .as_deref()
                .ok_or_else(|| ActionError::validation(TargetField::Url.path()))?,
        };
        Ok(ResolvedTarget {
            site_url: normalize_site_url(url),
            scope: SecretScope {
                project_id: project_id.to_string(),
                environment: environment.to_string(),
                secret_path: target
                    .get(TargetField::SecretPath)
                    .unwrap_or(DEFAULT_SECRET_PATH)
                    .to_string(),
                include_imports: target.include_imports.unwrap_or(false),
            },
        })
    }

    pub fn credentials(&self) -> ActionResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            ActionError::Configuration(
                "Infisical credentials not configured. Set INFISICAL_CLIENT_ID and INFISICAL_CLIENT_SECRET"
                    .to_string(),
            )
        })
    }

    async fn open_session(&self, kind: &ActionKind, site_url: &str) -> ActionResult<Session> {
        let credentials = self
            .credentials()
            .map_err(|e| failed_in(HandlerPhase::Validating, kind, e))?;
        self.backend
            .login(site_url, credentials)
            .await
            .map_err(|e| failed_in(HandlerPhase::Authenticating, kind, ActionError::authentication(e)))
    }

    fn validate(&self, envelope: &ActionEnvelope) -> ActionResult<ResolvedTarget> {
        self.resolve_target(envelope)
            .map_err(|e| failed_in(HandlerPhase::Validating, envelope.kind(), e))
    }

    /// Every secret visible in the envelope's scope, as name/value pairs
    async fn fetch(&self, envelope: &ActionEnvelope) -> ActionResult<Vec<SecretEntry>> {
        let kind = envelope.kind();
        let resolved = self.validate(envelope)?;
        let session = self.open_session(kind, &resolved.site_url).await?;
        let scope = &resolved.scope;

        info!(
            url = %resolved.site_url,
            project = %scope.project_id,
            env = %scope.environment,
            path = %scope.secret_path,
            include_imports = scope.include_imports,
            backend = self.backend.backend_type(),
            "retrieving secrets"
        );

        let secrets = self
            .backend
            .list_secrets(&session, scope)
            .await
            .map_err(|e| failed_in(HandlerPhase::Retrieving, kind, ActionError::retrieval(e)))?;

        info!(count = secrets.len(), "retrieved secrets");
        Ok(secrets.into_iter().map(entry).collect())
    }

    async fn write(&self, envelope: &ActionEnvelope, op: WriteOp) -> ActionResult<ActionOutcome> {
        let kind = envelope.kind();
        let resolved = self.validate(envelope)?;
        let (name, value) =
            object_fields(envelope, op).map_err(|e| failed_in(HandlerPhase::Validating, kind, e))?;
        let session = self.open_session(kind, &resolved.site_url).await?;
        let scope = &resolved.scope;

        info!(
            url = %resolved.site_url,
            project = %scope.project_id,
            env = %scope.environment,
            path = %scope.secret_path,
            secret = name,
            operation = op.verb(),
            "writing secret"
        );

        let backend = &self.backend;
        let value = value.unwrap_or_default();
        let written = match op {
            WriteOp::Create => backend.create_secret(&session, scope, name, value).await,
            WriteOp::Update => backend.update_secret(&session, scope, name, value).await,
            WriteOp::Delete => backend.delete_secret(&session, scope, name).await,
        }
        .map_err(|e| failed_in(HandlerPhase::Writing, kind, ActionError::backend(op.verb(), e)))?;

        Ok(ActionOutcome::Structured {
            value: json!({
                "identifier": written.secret_key,
                "environment": scope.environment,
                "secretPath": scope.secret_path,
                "version": written.version,
            }),
            schema: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOp {
    Create,
    Update,
    Delete,
}

impl WriteOp {
    fn verb(self) -> &'static str {
        match self {
            WriteOp::Create => "create",
            WriteOp::Update => "update",
            WriteOp::Delete => "delete",
        }
    }
}

fn entry(secret: BackendSecret) -> SecretEntry {
    debug!(name = %secret.secret_key, value = %mask_secret(&secret.secret_value), "retrieved secret");
    SecretEntry::new(secret.secret_key, secret.secret_value)
}

fn object_fields(envelope: &ActionEnvelope, op: WriteOp) -> ActionResult<(&str, Option<&str>)> {
    let object = envelope.require_object()?;
    let name = object.identifier()?;
    let value = match op {
        WriteOp::Delete => None,
        WriteOp::Create | WriteOp::Update => Some(object.value()?),
    };
    Ok((name, value))
}

/// `RetrieveAction`: every secret in the target scope
pub struct RetrieveSecretsHandler {
    ctx: Arc<SecretsContext>,
}

impl RetrieveSecretsHandler {
    pub fn new(ctx: Arc<SecretsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionHandler for RetrieveSecretsHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::new(ActionKind::RETRIEVE)
    }

    fn description(&self) -> String {
        "Retrieves credentials from Infisical secrets manager".to_string()
    }

    fn result_schema(&self) -> Option<ResultSchema> {
        Some(ResultSchema::property_value_list())
    }

    async fn handle(&self, envelope: &mut ActionEnvelope) -> ActionResult<()> {
        let secrets = self.ctx.fetch(envelope).await?;
        envelope.complete(ActionOutcome::Secrets(secrets));
        Ok(())
    }
}

/// `SearchAction`: secrets whose name equals `query` (or `object.identifier`)
pub struct SearchSecretsHandler {
    ctx: Arc<SecretsContext>,
}

impl SearchSecretsHandler {
    pub fn new(ctx: Arc<SecretsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionHandler for SearchSecretsHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::new(ActionKind::SEARCH)
    }

    fn description(&self) -> String {
        "Looks up secrets by name in Infisical".to_string()
    }

    fn result_schema(&self) -> Option<ResultSchema> {
        Some(ResultSchema::property_value_list())
    }

    async fn handle(&self, envelope: &mut ActionEnvelope) -> ActionResult<()> {
        let term = envelope
            .query
            .clone()
            .or_else(|| envelope.object.as_ref().and_then(|o| o.identifier.clone()));
        let mut secrets = self.ctx.fetch(envelope).await?;
        if let Some(term) = term {
            secrets.retain(|s| s.name == term);
        }
        envelope.complete(ActionOutcome::Secrets(secrets));
        Ok(())
    }
}

/// `CreateAction`: store `object.value` under `object.identifier`
pub struct CreateSecretHandler {
    ctx: Arc<SecretsContext>,
}

impl CreateSecretHandler {
    pub fn new(ctx: Arc<SecretsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionHandler for CreateSecretHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::new(ActionKind::CREATE)
    }

    fn description(&self) -> String {
        "Creates a secret in Infisical".to_string()
    }

    async fn handle(&self, envelope: &mut ActionEnvelope) -> ActionResult<()> {
        let outcome = self.ctx.write(envelope, WriteOp::Create).await?;
        envelope.complete(outcome);
        Ok(())
    }
}

/// `UpdateAction`: replace the value of `object.identifier`
pub struct UpdateSecretHandler {
    ctx: Arc<SecretsContext>,
}

impl UpdateSecretHandler {
    pub fn new(ctx: Arc<SecretsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionHandler for UpdateSecretHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::new(ActionKind::UPDATE)
    }

    fn description(&self) -> String {
        "Updates a secret value in Infisical".to_string()
    }

    async fn handle(&self, envelope: &mut ActionEnvelope) -> ActionResult<()> {
        let outcome = self.ctx.write(envelope, WriteOp::Update).await?;
        envelope.complete(outcome);
        Ok(())
    }
}

/// `DeleteAction`: remove `object.identifier`
pub struct DeleteSecretHandler {
    ctx: Arc<SecretsContext>,
}

impl DeleteSecretHandler {
    pub fn new(ctx: Arc<SecretsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ActionHandler for DeleteSecretHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::new(ActionKind::DELETE)
    }

    fn description(&self) -> String {
        "Deletes a secret from Infisical".to_string()
    }

    async fn handle(&self, envelope: &mut ActionEnvelope) -> ActionResult<()> {
        let outcome = self.ctx.write(envelope, WriteOp::Delete).await?;
        envelope.complete(outcome);
        Ok(())
    }
}

/// Register all secret handlers sharing one context
pub fn register_secret_handlers(
    registry: &mut ActionRegistry,
    ctx: Arc<SecretsContext>,
) -> RegistryResult<()> {
    registry.register(Arc::new(RetrieveSecretsHandler::new(ctx.clone())))?;
    registry.register(Arc::new(SearchSecretsHandler::new(ctx.clone())))?;
    registry.register(Arc::new(CreateSecretHandler::new(ctx.clone())))?;
    registry.register(Arc::new(UpdateSecretHandler::new(ctx.clone())))?;
    registry.register(Arc::new(DeleteSecretHandler::new(ctx)))?;
    Ok(())
}
