//! Deterministic, dependency-free embedding provider based on feature hashing.
//!
//! Useful offline, in demos, and in tests: no model download, no network,
//! and identical text always maps to the identical vector.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// An [`EmbeddingProvider`] that hashes word tokens and character trigrams
/// into a fixed number of signed buckets, then L2-normalises the result.
///
/// Word tokens are lower-cased runs of alphanumeric characters. Character
/// trigrams are taken over the whole lower-cased text with whitespace
/// collapsed, which gives scripts written without spaces (Thai, Japanese)
/// useful overlap.
///
/// # Example
///
/// ```rust,ignore
/// use rag_engine::HashingEmbeddingProvider;
///
/// let provider = HashingEmbeddingProvider::new(384);
/// let a = provider.embed("black holes").await?;
/// let b = provider.embed("black holes").await?;
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Default dimensionality, matching common sentence-embedding models.
    pub const DEFAULT_DIMENSIONS: usize = 384;

    /// Create a provider producing vectors of `dimensions` components.
    ///
    /// A zero dimension is clamped to one.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
        let (mut vector, features) = self.hash_features(text);

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            let message = if features == 0 {
                "text contains no embeddable tokens".to_string()
            } else {
                format!("{features} hashed features cancelled to a zero vector")
            };
            return Err(RagError::EmbeddingFailure { provider: self.name().to_string(), message });
        }
        vector.iter_mut().for_each(|x| *x /= norm);
        Ok(vector)
    }

    /// Unnormalised bucket sums and the number of features hashed into them.
    fn hash_features(&self, text: &str) -> (Vec<f32>, usize) {
        let lowered = text.to_lowercase();
        let mut vector = vec![0.0f32; self.dimensions];
        let mut features = 0;

        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            self.accumulate(&mut vector, word, WORD_WEIGHT);
            features += 1;
        }

        let chars: Vec<char> = lowered.split_whitespace().flat_map(|w| w.chars().chain([' '])).collect();
        let mut gram = String::with_capacity(12);
        for window in chars.windows(3) {
            gram.clear();
            gram.extend(window);
            self.accumulate(&mut vector, &gram, TRIGRAM_WEIGHT);
            features += 1;
        }
        (vector, features)
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_sync(text)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_gives_identical_vectors() {
        let provider = HashingEmbeddingProvider::new(64);
        let a = provider.embed("Newton's laws of motion").await.unwrap();
        let b = provider.embed("Newton's laws of motion").await.unwrap();
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let provider = HashingEmbeddingProvider::default();
        let v = provider.embed("ดาราศาสตร์และหลุมดำ").await.unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn blank_text_is_an_error_not_a_zero_vector() {
        let provider = HashingEmbeddingProvider::new(16);
        let err = provider.embed("   ").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingFailure { ref provider, .. } if provider == "hashing"));
        assert!(err.to_string().contains("no embeddable tokens"));
    }

    #[tokio::test]
    async fn cancelled_features_are_reported_as_such() {
        // With one bucket, the signed word and trigram weights of "ab cd" sum to zero.
        let provider = HashingEmbeddingProvider::new(1);
        let (vector, features) = provider.hash_features("ab cd");
        assert_eq!(vector, vec![0.0]);
        assert_eq!(features, 6);

        let err = provider.embed("ab cd").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("6 hashed features cancelled"), "{message}");
        assert!(!message.contains("no embeddable tokens"));
    }

    #[tokio::test]
    async fn related_text_is_closer_than_unrelated_text() {
        let provider = HashingEmbeddingProvider::new(256);
        let query = provider.embed("black hole gravity").await.unwrap();
        let near = provider.embed("the gravity of a black hole").await.unwrap();
        let far = provider.embed("birthday party invitation").await.unwrap();

        let dist = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>();
        assert!(dist(&query, &near) < dist(&query, &far));
    }
}
