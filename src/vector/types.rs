//! Shared value types passed between embedders and stores.

use serde::{Deserialize, Serialize};

/// Opaque key/value metadata carried alongside a document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Namespace used when a document or query leaves it empty.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Result count used when a query asks for zero or fewer hits.
pub const DEFAULT_TOP_K: usize = 5;

/// Map an empty namespace to [`DEFAULT_NAMESPACE`].
pub fn normalize_namespace(namespace: &str) -> &str {
    if namespace.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        namespace
    }
}

/// A single indexed item.
///
/// The embedding may be left empty when only metadata is being written;
/// backends that require a vector skip such documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique within one store.
    pub id: String,
    /// Raw content, if the caller wants to keep it.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Logical partition. Empty means [`DEFAULT_NAMESPACE`].
    #[serde(default)]
    pub namespace: String,
}

impl Document {
    pub fn new(id: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            embedding,
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// The namespace this document is stored under.
    pub fn effective_namespace(&self) -> &str {
        normalize_namespace(&self.namespace)
    }
}

/// A similarity search request scoped to one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub vector: Vec<f32>,
    /// Result cap. Zero or negative falls back to [`DEFAULT_TOP_K`].
    #[serde(default)]
    pub top_k: i64,
    #[serde(default)]
    pub namespace: String,
    /// Metadata filter: every key must be present on a hit with an equal value.
    /// Empty means no filtering.
    #[serde(default)]
    pub filter: Metadata,
}

impl Query {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            ..Default::default()
        }
    }

    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_filter(mut self, filter: Metadata) -> Self {
        self.filter = filter;
        self
    }

    pub fn effective_top_k(&self) -> usize {
        if self.top_k <= 0 {
            DEFAULT_TOP_K
        } else {
            usize::try_from(self.top_k).unwrap_or(usize::MAX)
        }
    }

    pub fn effective_namespace(&self) -> &str {
        normalize_namespace(&self.namespace)
    }
}

/// One ranked search result. Larger scores are more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    pub score: f64,
    pub metadata: Metadata,
}
