//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Dispatcher assembly or an offline dispatch failed
    #[error("Dispatch failed with status {status}: {source}")]
    Dispatch {
        status: u16,
        #[source]
        source: dispatcher::DispatcherError,
    },

    /// HTTP listener could not be bound
    #[error("Failed to bind {listen}: {source}")]
    Bind {
        listen: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

impl From<dispatcher::DispatcherError> for CliError {
    fn from(source: dispatcher::DispatcherError) -> Self {
        Self::Dispatch {
            status: source.status_code(),
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
