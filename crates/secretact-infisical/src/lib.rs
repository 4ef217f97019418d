//! Infisical integration
//!
//! The [`SecretsBackend`] trait is the seam between action handlers and the
//! secrets manager; [`InfisicalClient`] implements it over HTTP.

pub mod backend;
pub mod client;
pub mod handlers;
pub mod site;

pub use backend::{
    BackendError, BackendResult, BackendSecret, Credentials, SecretScope, SecretsBackend, Session,
};
pub use client::InfisicalClient;
pub use handlers::{
    register_secret_handlers, CreateSecretHandler, DeleteSecretHandler, HandlerPhase,
    ResolvedTarget, RetrieveSecretsHandler, SearchSecretsHandler, SecretsContext,
    UpdateSecretHandler,
};
pub use site::normalize_site_url;
