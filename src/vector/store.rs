//! VectorStore abstraction and the upsert batch report.

use crate::error::Result;
use crate::vector::types::{Document, Hit, Query};
use async_trait::async_trait;
use std::fmt;

/// Storage backend for embeddings, scoped by namespace.
///
/// Every backend exposes the same contract so callers stay agnostic of where
/// vectors live. Dropping a returned future aborts the in-flight operation.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or fully replace documents by id.
    ///
    /// Invalid entries are skipped and listed in the returned report rather
    /// than failing the batch. Backends with a fixed dimension reject the
    /// whole batch on a dimension mismatch.
    async fn upsert(&self, documents: Vec<Document>) -> Result<UpsertReport>;

    /// Remove documents by id. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<()>;

    /// Return at most `top_k` hits from the query's namespace, best first.
    ///
    /// An empty or unknown namespace yields an empty result, not an error.
    async fn query(&self, query: &Query) -> Result<Vec<Hit>>;

    /// Release backend resources.
    async fn close(&self) -> Result<()>;
}

/// Why a document was left out of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyId,
    EmptyEmbedding,
    DimensionMismatch { expected: usize, actual: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyId => f.write_str("empty id"),
            SkipReason::EmptyEmbedding => f.write_str("empty embedding"),
            SkipReason::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: got {actual}, want {expected}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub id: String,
    pub reason: SkipReason,
}

/// Per-document outcome of an upsert batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Ids written, in batch order.
    pub upserted: Vec<String>,
    pub skipped: Vec<SkippedDocument>,
}

impl UpsertReport {
    /// True when nothing was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub(crate) fn skip(&mut self, id: &str, reason: SkipReason) {
        tracing::warn!(id, %reason, "skipping document in upsert batch");
        self.skipped.push(SkippedDocument {
            id: id.to_string(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_tracks_skips() {
        let mut report = UpsertReport::default();
        assert!(report.is_complete());

        report.upserted.push("a".into());
        report.skip(
            "b",
            SkipReason::DimensionMismatch {
                expected: 4,
                actual: 2,
            },
        );
        assert!(!report.is_complete());
        assert_eq!(report.skipped[0].id, "b");
        assert_eq!(
            report.skipped[0].reason.to_string(),
            "dimension mismatch: got 2, want 4"
        );
    }
}
