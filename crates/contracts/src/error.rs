//! Layered error definitions
//!
//! Categorized by source: config / classifier / session.
//! Insufficient data is not an error anywhere in the pipeline; stages return
//! `None` or an empty collection instead.

use thiserror::Error;

/// Unified error type
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

    // ===== Classifier Errors =====
    /// The classifier failed to produce any output
    #[error("classifier '{name}' failed: {message}")]
    Classifier { name: String, message: String },

    /// The classifier produced output that matches none of the accepted shapes
    #[error("unparseable classifier output: {message}")]
    ClassifierOutput { message: String },

    // ===== Session Errors =====
    /// Operation not valid in the current session state
    #[error("session state error: {message}")]
    SessionState { message: String },

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

    /// Create classifier execution error
    pub fn classifier(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Classifier {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create classifier output shape error
    pub fn classifier_output(message: impl Into<String>) -> Self {
        Self::ClassifierOutput {
            message: message.into(),
        }
    }

    /// Create session state error
    pub fn session_state(message: impl Into<String>) -> Self {
        Self::SessionState {
            message: message.into(),
        }
    }

    /// Whether this error belongs to the configuration category (fatal at startup)
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigParse { .. } | Self::ConfigValidation { .. })
    }
}

impl From<validator::ValidationErrors> for ContractError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first offending field, matching the validator pass ordering
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
        Self::ConfigValidation { field, message }
    }
}
