//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Privileged operation attempted while system actions are disabled
    #[error("system actions are disabled for this deployment")]
    ActionsDisabled,

    /// `action` parameter names no known action
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    /// `format` parameter names no known transport format
    #[error("unknown format '{name}'")]
    UnknownFormat { name: String },

    /// `period` parameter names no known period
    #[error("unknown period '{value}'")]
    UnknownPeriod { value: String },

    /// Graph width/height missing or not a non-negative integer
    #[error("invalid graph {parameter} '{value}'")]
    InvalidDimension {
        parameter: &'static str,
        value: String,
    },

    /// Builder finished without a required collaborator
    #[error("dispatcher requires a {0} collaborator")]
    MissingCollaborator(&'static str),

    /// Snapshot could not be encoded
    #[error("{format} serialization failed: {message}")]
    Serialization {
        format: &'static str,
        message: String,
    },

    /// Collaborator error
    #[error("collaborator error: {0}")]
    Contract(ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// HTTP status the transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ActionsDisabled => 403,
            Self::UnknownAction { .. }
            | Self::UnknownFormat { .. }
            | Self::UnknownPeriod { .. }
            | Self::InvalidDimension { .. } => 400,
            _ => 500,
        }
    }

    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ActionsDisabled => "actions_disabled",
            Self::UnknownAction { .. } => "unknown_action",
            Self::UnknownFormat { .. } => "unknown_format",
            Self::UnknownPeriod { .. } => "unknown_period",
            Self::InvalidDimension { .. } => "invalid_dimension",
            Self::MissingCollaborator(_) => "missing_collaborator",
            Self::Serialization { .. } => "serialization",
            Self::Contract(_) => "collaborator",
            Self::Io(_) => "io",
        }
    }
}

impl From<ContractError> for DispatcherError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::UnknownAction { name } => Self::UnknownAction { name },
            ContractError::UnknownPeriod { value } => Self::UnknownPeriod { value },
            ContractError::Io(e) => Self::Io(e),
            other => Self::Contract(other),
        }
    }
}
