//! Layered error definitions
//!
//! Categorized by source: config / collaborator / introspection / request

use thiserror::Error;

/// Unified error type shared by the dispatcher and its collaborators
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Request Decoding Errors =====
    /// Period token did not match any known aggregation window
    #[error("unknown period '{value}'")]
    UnknownPeriod { value: String },

    /// Action name did not match any known privileged action
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    // ===== Collaborator Errors =====
    /// Heap histogram / process list collection failed
    #[error("introspection of {what} failed: {message}")]
    Introspection { what: String, message: String },

    /// Report or graph rendering failed
    #[error("{renderer} rendering failed: {message}")]
    Render { renderer: String, message: String },

    /// The collaborator cannot perform the operation on this runtime
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create introspection error
    pub fn introspection(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Introspection {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create render error
    pub fn render(renderer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            renderer: renderer.into(),
            message: message.into(),
        }
    }

    /// Message suitable for display inside a rendered view
    pub fn display_message(&self) -> String {
        match self {
            Self::Introspection { message, .. } | Self::Render { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
