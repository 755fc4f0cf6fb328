// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::llm::LlmError;

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed TOML in {path}: {message}")]
    MalformedToml { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failure inside one plan-analysis step. Never fatal to a report run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Plan retrieval failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("LLM returned an empty query for bind resolution")]
    EmptyResolvedQuery,
}

/// Errors that abort a report run
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to fetch slow queries: {0}")]
    TopQueries(#[source] CatalogError),

    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}
