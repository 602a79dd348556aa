//! Configuration for the retriever and prompt composer.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the RAG engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Path of the JSON snapshot backing the document store.
    pub snapshot_path: PathBuf,
    /// Number of documents retrieved as context for a query.
    pub top_k: usize,
    /// Upper bound on a single embedding call.
    #[serde(with = "duration_ms")]
    pub embedding_timeout: Duration,
    /// Upper bound on a single generation call.
    #[serde(with = "duration_ms")]
    pub generation_timeout: Duration,
    /// Language the generated answer must be written in.
    pub response_language: String,
    /// Largest accepted image, in bytes.
    pub max_image_bytes: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("rag_database.json"),
            top_k: 3,
            embedding_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(60),
            response_language: "Thai".to_string(),
            max_image_bytes: 1024 * 1024,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `top_k == 0`
    /// - either timeout is zero
    /// - `response_language` is blank
    /// - `max_image_bytes == 0`
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.embedding_timeout.is_zero() {
            return Err(RagError::ConfigError("embedding_timeout must be non-zero".to_string()));
        }
        if self.generation_timeout.is_zero() {
            return Err(RagError::ConfigError("generation_timeout must be non-zero".to_string()));
        }
        if self.response_language.trim().is_empty() {
            return Err(RagError::ConfigError("response_language must not be empty".to_string()));
        }
        if self.max_image_bytes == 0 {
            return Err(RagError::ConfigError(
                "max_image_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the snapshot file path.
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    /// Set the number of documents retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the bound on embedding calls.
    pub fn embedding_timeout(mut self, timeout: Duration) -> Self {
        self.config.embedding_timeout = timeout;
        self
    }

    /// Set the bound on generation calls.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = timeout;
        self
    }

    /// Set the language answers are written in.
    pub fn response_language(mut self, language: impl Into<String>) -> Self {
        self.config.response_language = language.into();
        self
    }

    /// Set the largest accepted image size in bytes.
    pub fn max_image_bytes(mut self, limit: usize) -> Self {
        self.config.max_image_bytes = limit;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
