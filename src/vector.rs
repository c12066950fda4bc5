//! Vector similarity retrieval: embedders and namespaced vector stores.

pub mod embedding;
pub mod memory_store;
pub mod openai;
pub mod pgvector;
pub mod ranking;
pub mod store;
pub mod types;

pub use embedding::{Embedder, MockEmbedder, cosine_similarity};
pub use memory_store::InMemoryStore;
pub use openai::{OpenAiEmbedder, OpenAiEmbedderConfig};
pub use pgvector::{PgVectorConfig, PgVectorStore};
pub use ranking::Metric;
pub use store::{SkipReason, SkippedDocument, UpsertReport, VectorStore};
pub use types::{
    DEFAULT_NAMESPACE, DEFAULT_TOP_K, Document, Hit, Metadata, Query, normalize_namespace,
};
