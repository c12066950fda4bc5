//! Namespaced vector similarity retrieval.
//!
//! Callers obtain vectors from an [`Embedder`] and issue upserts, deletes and
//! queries against a [`VectorStore`]. Both store backends ([`InMemoryStore`]
//! and [`PgVectorStore`]) satisfy the same trait and rank with larger scores
//! meaning more similar.

pub mod config;
pub mod error;
pub mod vector;

pub use config::Config;
pub use error::{Error, Result};
pub use vector::{
    Document, Embedder, Hit, InMemoryStore, Metadata, Metric, MockEmbedder, OpenAiEmbedder,
    PgVectorStore, Query, UpsertReport, VectorStore,
};
