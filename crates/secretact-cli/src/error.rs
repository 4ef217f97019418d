//! Error types for the CLI

use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Server error: {0}")]
    Server(#[from] secretact_server::ServerError),

    #[error("General error: {0}")]
    General(String),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::General(err.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
