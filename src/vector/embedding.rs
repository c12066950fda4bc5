//! Embedder abstraction, the deterministic mock embedder and cosine similarity.

use crate::error::Result;
use async_trait::async_trait;

/// Turns texts into embedding vectors.
///
/// Implementations return exactly one vector per input, in input order, or
/// an error with no partial results.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Dimension used by [`MockEmbedder`] when none is given.
pub const DEFAULT_MOCK_DIMENSION: usize = 16;

/// Offline embedder that derives vectors from the bytes of the text.
///
/// The same text always maps to the same vector, in any process. The vectors
/// carry no semantic meaning; this exists so retrieval tests are reproducible.
#[derive(Debug, Clone, Copy)]
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Create a mock embedder. A dimension of 0 falls back to 16.
    pub fn new(dimension: usize) -> Self {
        let dimension = if dimension == 0 {
            DEFAULT_MOCK_DIMENSION
        } else {
            dimension
        };
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed one text (synchronous).
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return vec![0.0; self.dimension];
        }

        (0..self.dimension)
            .map(|position| f32::from(bytes[position % bytes.len()] % 97) / 100.0)
            .collect()
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_DIMENSION)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tracing::debug!(count = texts.len(), dimension = self.dimension, "mock embedding");
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in [-1, 1] where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal
/// - -1.0 means opposite direction
///
/// Returns 0.0 if either vector is empty, has zero magnitude, or the lengths
/// differ. Accumulates in f64.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (mut dot_product, mut magnitude_a, mut magnitude_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot_product += x * y;
        magnitude_a += x * x;
        magnitude_b += y * y;
    }

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a.sqrt() * magnitude_b.sqrt())
}
