//! Error types for the registry

use secretact_core::ActionKind;
use thiserror::Error;

/// Registry-specific errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a handler for '{0}' is already registered")]
    DuplicateHandler(ActionKind),
}

/// Registry result type
pub type RegistryResult<T> = Result<T, RegistryError>;
