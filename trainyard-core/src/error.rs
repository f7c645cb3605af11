//! Error types for the trainyard-core crate.

use crate::schema::ValidationReport;
use thiserror::Error;

/// Top-level error type for pipeline operations.
///
/// Every stage failure surfaces as one of these variants so the orchestrator
/// can classify failures uniformly. A reject decision at the evaluation gate
/// is not an error and never appears here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Data source returned zero records")]
    EmptyDataset,

    #[error("Schema validation failed with {} violation(s)", .0.violations.len())]
    Validation(ValidationReport),

    #[error("Transformation error: {0}")]
    Transformation(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Registry write error: {0}")]
    RegistryWrite(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Run aborted: {0}")]
    Aborted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn transformation(msg: impl Into<String>) -> Self {
        Self::Transformation(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    pub fn registry_write(msg: impl Into<String>) -> Self {
        Self::RegistryWrite(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
