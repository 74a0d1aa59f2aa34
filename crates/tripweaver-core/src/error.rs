//! ============================================================================
//! Error Taxonomy for the RAG Pipeline
//! ============================================================================
//! Four failure classes with distinct propagation rules:
//! - Remote: transient service hiccup, eligible for retry
//! - DimensionMismatch: configuration/model bug, never retried
//! - Normalization: one malformed record, dropped from its collection
//! - RetriesExhausted: terminal wrapper once the retry budget is spent
//!
//! Cache corruption is intentionally NOT an error variant: a cached payload
//! that fails to parse is reported as `CacheLookup::Corrupt` and treated as
//! a miss (see `pipeline::embedding`).
//! ============================================================================

use thiserror::Error;

/// Errors produced by the RAG pipeline and its collaborator clients
#[derive(Debug, Error)]
pub enum RagError {
    /// A remote service call failed (network, 5xx, malformed response).
    /// Transient: the retry executor will re-attempt these.
    #[error("remote service error: {0}")]
    Remote(String),

    /// The embedding service returned a vector of the wrong length.
    /// Fatal: signals a model/config mismatch, never padded or truncated.
    #[error("embedding dimension mismatch: got {got}, expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },

    /// A single record could not be converted to its canonical shape.
    /// Record-level: the caller drops the record and keeps going.
    #[error("failed to normalize record: {0}")]
    Normalization(String),

    /// All retry attempts were spent; wraps the final failure.
    #[error("operation failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<RagError>,
    },

    /// Invalid or incomplete configuration (missing env vars, bad URL).
    #[error("configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// Whether the retry executor should re-attempt after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, RagError::Remote(_))
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Remote(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RagError::Remote("connection reset".into()).is_transient());
        assert!(!RagError::DimensionMismatch { got: 512, expected: 1536 }.is_transient());
        assert!(!RagError::Normalization("missing id".into()).is_transient());
        assert!(!RagError::Config("missing NEO4J_HTTP_URL".into()).is_transient());
    }

    #[test]
    fn test_exhausted_preserves_source() {
        let err = RagError::RetriesExhausted {
            attempts: 3,
            source: Box::new(RagError::Remote("timeout".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("timeout"));
    }
}
