//! Error types for the `semvec-rag` crate.

use thiserror::Error;

/// Errors that can occur while chunking, embedding, storing or matching text.
#[derive(Debug, Error)]
pub enum RagError {
    /// The caller submitted no text (or only whitespace).
    #[error("{field} must not be empty")]
    EmptyInput {
        /// The input field that was empty (`text`, `query`, ...).
        field: &'static str,
    },

    /// The remote embedding capability failed or returned malformed output.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Two vectors that must share a dimensionality do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality of the stored vectors (or the model).
        expected: usize,
        /// The dimensionality that was supplied.
        actual: usize,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
        /// Whether the failure was a timeout or connectivity problem.
        transient: bool,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Shorthand for a non-transient [`RagError::VectorStoreError`].
    pub fn store(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VectorStoreError {
            backend: backend.into(),
            message: message.into(),
            transient: false,
        }
    }

    /// Shorthand for a transient [`RagError::VectorStoreError`].
    pub fn store_transient(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VectorStoreError { backend: backend.into(), message: message.into(), transient: true }
    }

    /// Shorthand for a [`RagError::EmbeddingError`].
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.into(), message: message.into() }
    }

    /// Whether retrying the same request with backoff may succeed.
    ///
    /// Embedding failures are treated as transient. Store failures are only
    /// retryable when they were caused by a timeout or a lost connection;
    /// constraint and schema errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EmbeddingError { .. } => true,
            Self::VectorStoreError { transient, .. } => *transient,
            Self::EmptyInput { .. } | Self::DimensionMismatch { .. } | Self::ConfigError(_) => {
                false
            }
        }
    }

    /// The message shown to end users at the API boundary.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput { field: "query" } => "Query is a required field".to_string(),
            Self::EmptyInput { .. } => "Please enter some text to embed".to_string(),
            Self::EmbeddingError { message, .. } => format!("Failed to embed text: {message}"),
            Self::DimensionMismatch { expected, actual } => format!(
                "Embedding has {actual} dimensions but the vector database expects {expected}"
            ),
            Self::VectorStoreError { .. } => "Error while querying vector database".to_string(),
            Self::ConfigError(message) => format!("Invalid configuration: {message}"),
        }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
