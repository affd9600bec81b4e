//! Shared test doubles for skillforge crates.
//!
//! Gated behind the `test-utils` feature so production builds never link
//! them in.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::embed::{EmbedError, HashEmbedder, TextEmbedder};

/// Wraps [`HashEmbedder`] and counts how many times `embed` was called,
/// so tests can assert on embedder call counts (e.g. that a cached query
/// embedding isn't recomputed).
pub struct CountingEmbedder {
    inner: HashEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: HashEmbedder::new(dimension),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextEmbedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

/// An embedder that always fails, for exercising `QueryEmbeddingFailed`
/// error paths.
pub struct FailingEmbedder {
    dimension: usize,
}

impl FailingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl TextEmbedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
        Err(EmbedError::Backend("simulated embedder failure".into()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
