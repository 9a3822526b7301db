//! Error types for the contract compiler

use thiserror::Error;

use crate::lint::ValidationFinding;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Pipeline errors, one variant per failing stage
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Contract has {} error(s)", .errors.len())]
    ContractInvalid { errors: Vec<ValidationFinding> },

    #[error("Strict mode: contract has {} warning(s)", .warnings.len())]
    StrictWarnings { warnings: Vec<ValidationFinding> },

    #[error("Unknown output format '{0}'. Expected one of: typescript, axios, react-query, openapi")]
    UnknownFormat(String),

    #[error("Failed to render {subject}: {message}")]
    Render { subject: String, message: String },

    #[error("Unknown render helper '{0}'")]
    UnknownHelper(String),

    #[error("Formatter failed: {0}")]
    Formatter(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl CodegenError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub(crate) fn render(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Findings attached to this error, if any
    pub fn findings(&self) -> &[ValidationFinding] {
        match self {
            Self::ContractInvalid { errors } => errors,
            Self::StrictWarnings { warnings } => warnings,
            _ => &[],
        }
    }
}
