//! SecretAct Server
//!
//! HTTP surface for secret actions: the semantic action endpoint, the REST
//! convenience adapters, health and docs, plus service-registry
//! registration.

pub mod app_state;
pub mod config;
pub mod discovery;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod restapi;

// Re-export key types
pub use app_state::AppState;
pub use config::ServiceConfig;
pub use discovery::{RegistrationGuard, RegistryClient, SharedRegistration};
pub use error::{ServerError, ServerResult};

pub const SERVICE_ID: &str = "infisicalservice";
pub const SERVICE_NAME: &str = "Infisical Secrets Management Service";
pub const SERVICE_DESCRIPTION: &str =
    "Secure secrets management using Infisical with semantic action support";
pub const CAPABILITIES: [&str; 3] = ["credential-management", "secrets-management", "infisical"];
pub const API_VERSION: &str = "v1";
