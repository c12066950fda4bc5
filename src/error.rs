//! Error types for configuration, embedding and vector storage.

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration errors, surfaced when a store or embedder is constructed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("dsn is required")]
    MissingDsn,

    #[error("dimension must be > 0, got {0}")]
    InvalidDimension(usize),

    #[error("unsupported metric: {0}")]
    UnsupportedMetric(String),

    /// Names the environment variable, never its value.
    #[error("API key is required (set {env})")]
    MissingApiKey { env: String },

    #[error("API key is required")]
    EmptyApiKey,

    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("unknown vector store: {0}")]
    UnknownStore(String),

    #[error("unknown embedder: {0}")]
    UnknownEmbedder(String),

    #[error("unsupported {what} kind: {kind}")]
    UnsupportedKind { what: &'static str, kind: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by embedding providers.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embeddings request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("embeddings API error: {0}")]
    Status(String),

    #[error("failed to decode embeddings response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("embedding response mismatch: got {got} vectors, want {want}")]
    CountMismatch { got: usize, want: usize },

    #[error("malformed embeddings response: {0}")]
    Malformed(String),
}

/// Errors raised by vector stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{} dimension mismatch: got {got}, want {want}", describe_subject(.id))]
    DimensionMismatch {
        /// Offending document, or `None` for a query vector.
        id: Option<String>,
        got: usize,
        want: usize,
    },

    #[error("{operation} failed: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    pub(crate) fn database(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Database { operation, source }
    }
}

fn describe_subject(id: &Option<String>) -> String {
    match id {
        Some(id) => format!("embedding for id={id}"),
        None => "query vector".to_string(),
    }
}
