//! The embedding seam between the Vector Store and whatever model produces
//! dense vectors for it.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedder produced a vector of dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedder backend failed: {0}")]
    Backend(String),
}

/// Produces a fixed-dimension dense vector for a piece of text.
///
/// Implementations must be deterministic for identical input and must
/// report a stable [`TextEmbedder::dimension`] for their lifetime; the
/// Vector Store treats a change in dimension as fatal
/// (`EmbeddingDimensionMismatch`) rather than silently re-indexing.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
    fn dimension(&self) -> usize;
}

/// Deterministic, non-cryptographic embedder for tests and as a
/// zero-dependency default. Hashes overlapping word shingles into buckets
/// of a fixed-dimension vector, then L2-normalizes — good enough to give
/// distinct inputs distinct directions without requiring a real model.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl TextEmbedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0f32; self.dimension];
        let lowercase = text.to_lowercase();
        for word in lowercase.split_whitespace() {
            let hash = blake3::hash(word.as_bytes());
            let bytes = hash.as_bytes();
            // Fold the 32-byte digest into a handful of (bucket, sign)
            // contributions so a single word touches several dimensions.
            for chunk in bytes.chunks_exact(4) {
                let value = u32::from_le_bytes(chunk.try_into().unwrap());
                let bucket = (value as usize) % self.dimension;
                let sign = if value & 1 == 0 { 1.0 } else { -1.0 };
                vector[bucket] += sign;
            }
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Wraps any [`TextEmbedder`] and enforces that every produced vector has
/// exactly the configured dimension, converting any drift into
/// [`EmbedError::DimensionMismatch`] instead of letting it silently
/// corrupt a downstream index.
pub struct FixedDimensionEmbedder<E: TextEmbedder> {
    inner: E,
    expected_dimension: usize,
}

impl<E: TextEmbedder> FixedDimensionEmbedder<E> {
    pub fn new(inner: E, expected_dimension: usize) -> Self {
        Self {
            inner,
            expected_dimension,
        }
    }
}

#[async_trait]
impl<E: TextEmbedder> TextEmbedder for FixedDimensionEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let vector = self.inner.embed(text).await?;
        if vector.len() != self.expected_dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: self.expected_dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.expected_dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn hash_embedder_distinguishes_inputs() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("testing tdd patterns").await.unwrap();
        let b = embedder.embed("deploying kubernetes manifests").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn hash_embedder_respects_configured_dimension() {
        let embedder = HashEmbedder::new(128);
        let vector = embedder.embed("anything").await.unwrap();
        assert_eq!(vector.len(), 128);
        assert_eq!(embedder.dimension(), 128);
    }

    #[tokio::test]
    async fn fixed_dimension_wrapper_passes_through_matching_vectors() {
        let embedder = FixedDimensionEmbedder::new(HashEmbedder::new(32), 32);
        let vector = embedder.embed("ok").await.unwrap();
        assert_eq!(vector.len(), 32);
    }
}
