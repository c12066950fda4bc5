//! In-process vector store with exact cosine scoring.

use crate::error::Result;
use crate::vector::embedding::cosine_similarity;
use crate::vector::ranking::{Scored, top_k};
use crate::vector::store::{SkipReason, UpsertReport, VectorStore};
use crate::vector::types::{Document, Hit, Metadata, Query};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// In-memory vector store.
///
/// Documents live in a map keyed by id; each namespace keeps the set of ids
/// it contains. One reader/writer lock guards both, so queries run
/// concurrently with each other and exclusively with writes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    /// Dimension pinned at construction, if any.
    fixed_dimension: Option<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, Document>,
    index: HashMap<String, BTreeSet<String>>,
    /// Dimension shared by every stored embedding; cleared when none remain.
    observed_dimension: Option<usize>,
    /// Number of stored documents with a non-empty embedding.
    embedded: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that only accepts embeddings of `dimension` components.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            inner: RwLock::default(),
            fixed_dimension: (dimension > 0).then_some(dimension),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.documents.is_empty()
    }
}

impl Inner {
    /// Dimension a new embedding for `id` must have. The document being
    /// replaced does not count, so overwriting the only stored vector may
    /// change the dimension.
    fn expected_dimension(&self, fixed: Option<usize>, id: &str) -> Option<usize> {
        if fixed.is_some() {
            return fixed;
        }
        let replaces_only_vector = self.embedded == 1
            && self
                .documents
                .get(id)
                .is_some_and(|existing| !existing.embedding.is_empty());
        if replaces_only_vector {
            None
        } else {
            self.observed_dimension
        }
    }

    fn remember(&mut self, dimension: usize) {
        if dimension > 0 {
            self.embedded += 1;
            self.observed_dimension = Some(dimension);
        }
    }

    fn forget(&mut self, document: &Document) {
        if document.embedding.is_empty() {
            return;
        }
        self.embedded = self.embedded.saturating_sub(1);
        if self.embedded == 0 {
            self.observed_dimension = None;
        }
    }

    fn remove_from_index(&mut self, namespace: &str, id: &str) {
        if let Some(ids) = self.index.get_mut(namespace) {
            ids.remove(id);
            if ids.is_empty() {
                self.index.remove(namespace);
            }
        }
    }
}

/// Every filter entry must be present in `metadata` with an equal value.
fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, expected)| metadata.get(key) == Some(expected))
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(&self, documents: Vec<Document>) -> Result<UpsertReport> {
        let mut report = UpsertReport::default();
        let mut inner = self.inner.write().await;

        for mut document in documents {
            if document.id.is_empty() {
                report.skip(&document.id, SkipReason::EmptyId);
                continue;
            }

            let actual = document.embedding.len();
            if actual > 0 {
                let expected = inner.expected_dimension(self.fixed_dimension, &document.id);
                if let Some(expected) = expected.filter(|expected| *expected != actual) {
                    report.skip(&document.id, SkipReason::DimensionMismatch { expected, actual });
                    continue;
                }
            }

            let namespace = document.effective_namespace().to_string();
            document.namespace = namespace.clone();
            let id = document.id.clone();

            if let Some(previous) = inner.documents.insert(id.clone(), document) {
                // An id moving to another namespace must leave the old index.
                if previous.namespace != namespace {
                    inner.remove_from_index(&previous.namespace, &id);
                }
                inner.forget(&previous);
            }
            inner.remember(actual);

            inner.index.entry(namespace).or_default().insert(id.clone());
            report.upserted.push(id);
        }

        tracing::debug!(
            upserted = report.upserted.len(),
            skipped = report.skipped.len(),
            "in-memory upsert"
        );

        Ok(report)
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut inner = self.inner.write().await;

        for id in ids {
            let Some(document) = inner.documents.remove(id) else {
                continue;
            };
            inner.remove_from_index(&document.namespace, id);
            inner.forget(&document);
        }

        tracing::debug!(count = ids.len(), "in-memory delete");
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Hit>> {
        let inner = self.inner.read().await;
        let namespace = query.effective_namespace();

        let Some(ids) = inner.index.get(namespace) else {
            return Ok(Vec::new());
        };

        let candidates = ids
            .iter()
            .filter_map(|id| inner.documents.get(id))
            .filter(|document| {
                !document.embedding.is_empty() && document.embedding.len() == query.vector.len()
            })
            .filter(|document| matches_filter(&document.metadata, &query.filter))
            .map(|document| Scored {
                score: cosine_similarity(&query.vector, &document.embedding),
                id: document.id.clone(),
                item: &document.metadata,
            });

        let hits: Vec<Hit> = top_k(candidates, query.effective_top_k())
            .into_iter()
            .map(|scored| Hit {
                id: scored.id,
                score: scored.score,
                metadata: scored.item.clone(),
            })
            .collect();

        tracing::debug!(namespace, hits = hits.len(), "in-memory query");
        Ok(hits)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
