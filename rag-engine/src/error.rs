//! Error types for the `rag-engine` crate.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::document::DocumentId;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An embedding's width does not match the store's dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality the store (or index) was configured with.
        expected: usize,
        /// The dimensionality of the rejected vector.
        actual: usize,
    },

    /// An embedding contains a NaN or infinite component.
    #[error("Invalid embedding: non-finite value at position {position}")]
    InvalidEmbedding {
        /// Index of the first offending component.
        position: usize,
    },

    /// A metadata number is NaN or infinite and cannot be written to a snapshot.
    #[error("Invalid metadata: non-finite number for key `{key}`")]
    InvalidMetadata {
        /// The offending metadata key.
        key: String,
    },

    /// A document id is out of range.
    #[error("Document {id} not found (store holds {len} documents)")]
    NotFound {
        /// The requested id.
        id: DocumentId,
        /// Number of documents in the store at the time of the lookup.
        len: usize,
    },

    /// The embedding backend failed or rejected its input.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingFailure {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding backend did not answer within the allotted time.
    #[error("Embedding timeout ({provider}) after {timeout:?}")]
    EmbeddingTimeout {
        /// The embedding provider that timed out.
        provider: String,
        /// The bound that elapsed.
        timeout: Duration,
    },

    /// The generation backend failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationFailure {
        /// The generation client that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation backend did not answer within the allotted time.
    #[error("Generation timeout ({provider}) after {timeout:?}")]
    GenerationTimeout {
        /// The generation client that timed out.
        provider: String,
        /// The bound that elapsed.
        timeout: Duration,
    },

    /// Reading or writing the document store snapshot failed.
    #[error("Snapshot error ({}): {message}", path.display())]
    Snapshot {
        /// Path of the snapshot file.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// An image exceeds the configured size limit.
    #[error("Image too large: {size} bytes exceeds limit of {limit} bytes")]
    ImageTooLarge {
        /// Size of the rejected image in bytes.
        size: usize,
        /// The configured limit in bytes.
        limit: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Returns `true` for [`RagError::EmbeddingTimeout`] and [`RagError::GenerationTimeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::EmbeddingTimeout { .. } | Self::GenerationTimeout { .. })
    }

    pub(crate) fn snapshot(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Snapshot { path: path.into(), message: message.to_string() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
