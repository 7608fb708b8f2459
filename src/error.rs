//! Error types for the review ingestion CLI.

use std::time::Duration;

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to configuration and secrets.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("missing environment variable: {0}")]
    MissingSecret(&'static str),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors raised while reading review records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read record source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record source: {0}")]
    Malformed(String),

    #[error("record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index} has invalid field `{field}`: {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding provider: {0}")]
    ConnectionError(String),

    #[error("embedding provider rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    #[error("embedding provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("embedding provider error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_)
            | EmbeddingError::Timeout
            | EmbeddingError::RateLimited { .. } => true,
            // Gateway errors and request timeouts are transient
            EmbeddingError::Api { status, .. } => *status == 408 || *status >= 500,
            EmbeddingError::Unauthorized(_) | EmbeddingError::InvalidResponse(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            EmbeddingError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Errors reported by the vector index service.
#[derive(Debug, Error)]
pub enum IndexServiceError {
    #[error("failed to connect to index service: {0}")]
    ConnectionError(String),

    #[error("index service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("index not found: {0}")]
    NotFound(String),

    #[error("index {name} not ready after {waited_secs}s")]
    NotReady { name: String, waited_secs: u64 },

    #[error("index {name} still terminating after {waited_secs}s")]
    StillTerminating { name: String, waited_secs: u64 },

    #[error("invalid index service response: {0}")]
    InvalidResponse(String),
}

impl Retryable for IndexServiceError {
    fn is_retryable(&self) -> bool {
        match self {
            IndexServiceError::ConnectionError(_) => true,
            IndexServiceError::Api { status, .. } => *status == 429 || *status >= 500,
            IndexServiceError::NotFound(_)
            | IndexServiceError::NotReady { .. }
            | IndexServiceError::StillTerminating { .. }
            | IndexServiceError::InvalidResponse(_) => false,
        }
    }
}

/// Run-level errors of the ingestion pipeline. Every variant is fatal.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("record error: {0}")]
    Record(#[from] RecordError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index service error: {0}")]
    IndexService(#[from] IndexServiceError),

    #[error(
        "embedding dimension mismatch{}: index expects {expected}, got {actual}",
        record_suffix(.record_id)
    )]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        record_id: Option<String>,
    },
}

fn record_suffix(record_id: &Option<String>) -> String {
    record_id
        .as_deref()
        .map(|id| format!(" for record {id}"))
        .unwrap_or_default()
}
