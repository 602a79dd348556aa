//! Embedding provider trait for generating vector embeddings from text.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (Gemini, OpenAI, a local
/// hashing model) behind a unified async interface. Every vector a provider
/// returns has exactly [`dimensions`](EmbeddingProvider::dimensions)
/// components, and identical input always yields an identical vector.
///
/// Providers report failures as [`RagError::EmbeddingFailure`]. They never
/// substitute a zero vector for text they could not embed.
///
/// # Example
///
/// ```rust,ignore
/// use rag_engine::{EmbeddingProvider, HashingEmbeddingProvider};
///
/// let provider = HashingEmbeddingProvider::new(384);
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short label for this provider, used in errors and logs.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Embed `text`, failing with [`RagError::EmbeddingTimeout`] if the provider
/// does not answer within `timeout`.
///
/// The returned vector is checked against the provider's declared
/// dimensionality.
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>> {
    debug!(provider = provider.name(), text_len = text.len(), "embedding text");
    let embedding = tokio::time::timeout(timeout, provider.embed(text)).await.map_err(|_| {
        warn!(provider = provider.name(), ?timeout, "embedding timed out");
        RagError::EmbeddingTimeout { provider: provider.name().to_string(), timeout }
    })??;
    check_dimensions(provider, &embedding)?;
    Ok(embedding)
}

/// Batch variant of [`embed_with_timeout`]; the bound covers the whole batch.
pub async fn embed_batch_with_timeout(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
    timeout: Duration,
) -> Result<Vec<Vec<f32>>> {
    debug!(provider = provider.name(), batch_size = texts.len(), "embedding batch");
    let embeddings =
        tokio::time::timeout(timeout, provider.embed_batch(texts)).await.map_err(|_| {
            warn!(provider = provider.name(), ?timeout, "batch embedding timed out");
            RagError::EmbeddingTimeout { provider: provider.name().to_string(), timeout }
        })??;

    if embeddings.len() != texts.len() {
        return Err(RagError::EmbeddingFailure {
            provider: provider.name().to_string(),
            message: format!("expected {} embeddings, got {}", texts.len(), embeddings.len()),
        });
    }
    for embedding in &embeddings {
        check_dimensions(provider, embedding)?;
    }
    Ok(embeddings)
}

fn check_dimensions(provider: &dyn EmbeddingProvider, embedding: &[f32]) -> Result<()> {
    if embedding.len() != provider.dimensions() {
        return Err(RagError::DimensionMismatch {
            expected: provider.dimensions(),
            actual: embedding.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider;

    #[async_trait]
    impl EmbeddingProvider for SlowProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![0.5; 4])
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct ShortProvider;

    #[async_trait]
    impl EmbeddingProvider for ShortProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0; 3])
        }

        fn dimensions(&self) -> usize {
            8
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_surfaces_timeout() {
        let err = embed_with_timeout(&SlowProvider, "hi", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmbeddingTimeout { ref provider, .. } if provider == "slow"));
    }

    #[tokio::test]
    async fn wrong_width_is_rejected() {
        let err = embed_with_timeout(&ShortProvider, "hi", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 8, actual: 3 }));
    }

    #[tokio::test]
    async fn batch_checks_every_width() {
        let out = embed_batch_with_timeout(&ShortProvider, &["a", "b"], Duration::from_secs(1)).await;
        assert!(matches!(out, Err(RagError::DimensionMismatch { .. })));
    }
}
