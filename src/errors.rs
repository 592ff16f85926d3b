//! Error types for spectrum-bridge
//!
//! `BridgeError` is what fallible library calls return. `ErrorKind` is the
//! serializable classification recorded inside retrieval outcomes, task
//! results and aggregate reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for the retrieval and orchestration layer
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Embedding collaborator errors
    #[error("Embedding failed: {0}")]
    EmbeddingError(String),

    /// Vector index errors
    #[error("Vector search failed: {0}")]
    VectorSearchError(String),

    /// Text generation API errors
    #[error("Generation API error: {0}")]
    GenerationApiError(String),

    /// Image synthesis API errors
    #[error("Image synthesis error: {0}")]
    ImageApiError(String),

    /// Input rejected before any collaborator was called
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A producer ran but could not produce a payload
    #[error("Producer error: {0}")]
    ProducerError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Request lifecycle errors
    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic errors with context
    #[error("Bridge error: {0}")]
    Generic(String),
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Convert anyhow errors to BridgeError
impl From<anyhow::Error> for BridgeError {
    fn from(err: anyhow::Error) -> Self {
        BridgeError::Generic(format!("{:#}", err))
    }
}

/// Failure taxonomy carried by outcomes and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Embedding or vector-search collaborator unreachable or erroring (fatal)
    RetrievalUnavailable,
    /// Retrieval succeeded with zero qualifying passages (fatal)
    EmptyRetrieval,
    /// An enrichment producer failed (task-local)
    ProducerError,
    /// An enrichment task exceeded its budget (task-local)
    Timeout,
    /// Query or retrieval parameters rejected before any external call (fatal)
    InvalidQuery,
}

impl ErrorKind {
    /// Whether this kind short-circuits the whole request
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::RetrievalUnavailable | ErrorKind::EmptyRetrieval | ErrorKind::InvalidQuery
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::RetrievalUnavailable => "RetrievalUnavailable",
            ErrorKind::EmptyRetrieval => "EmptyRetrieval",
            ErrorKind::ProducerError => "ProducerError",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::InvalidQuery => "InvalidQuery",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::Timeout { duration_ms: 1500 };
        assert!(err.to_string().contains("1500"));

        let err = BridgeError::VectorSearchError("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(ErrorKind::RetrievalUnavailable.is_fatal());
        assert!(ErrorKind::EmptyRetrieval.is_fatal());
        assert!(!ErrorKind::Timeout.is_fatal());
        assert!(!ErrorKind::ProducerError.is_fatal());
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: BridgeError = anyhow::anyhow!("model load failed").into();
        assert!(matches!(err, BridgeError::Generic(_)));
        assert!(err.to_string().contains("model load failed"));
    }
}
