//! OpenAI-compatible HTTP embedder.

use crate::error::{ConfigError, EmbeddingError, Result};
use crate::vector::embedding::Embedder;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`OpenAiEmbedder`].
#[derive(Clone)]
pub struct OpenAiEmbedderConfig {
    /// Empty means [`DEFAULT_BASE_URL`].
    pub base_url: String,
    pub api_key: String,
    /// Empty means [`DEFAULT_MODEL`].
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiEmbedderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for OpenAiEmbedderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbedderConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Embedder calling `POST {base_url}/v1/embeddings` with bearer auth.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
    #[serde(default)]
    index: Option<usize>,
}

impl OpenAiEmbedder {
    /// Build the embedder. Fails if the API key is empty.
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ConfigError::EmptyApiKey.into());
        }

        let base_url = if config.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            config.base_url.trim_end_matches('/')
        };
        let model = if config.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.model
        };

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| {
                ConfigError::Invalid(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{base_url}/v1/embeddings"),
            api_key: config.api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(count = texts.len(), model = %self.model, "requesting embeddings");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                input: texts,
                model: &self.model,
            })
            .send()
            .await
            .map_err(EmbeddingError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Status(status.to_string()).into());
        }

        let body: EmbeddingResponse = response.json().await.map_err(EmbeddingError::Decode)?;

        if body.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                got: body.data.len(),
                want: texts.len(),
            }
            .into());
        }

        Ok(order_by_index(body.data)?
            .into_iter()
            .map(|embedding| embedding.into_iter().map(|value| value as f32).collect())
            .collect())
    }
}

/// Put embeddings back in input order.
///
/// Without `index` fields the response order is trusted. Otherwise the
/// indices must be exactly `0..n`, each used once.
fn order_by_index(
    data: Vec<EmbeddingData>,
) -> std::result::Result<Vec<Vec<f64>>, EmbeddingError> {
    if data.iter().all(|item| item.index.is_none()) {
        return Ok(data.into_iter().map(|item| item.embedding).collect());
    }

    let count = data.len();
    let mut ordered: Vec<Option<Vec<f64>>> = vec![None; count];
    for item in data {
        let Some(index) = item.index else {
            return Err(EmbeddingError::Malformed("some items lack an index".into()));
        };
        match ordered.get_mut(index) {
            Some(slot) if slot.is_none() => *slot = Some(item.embedding),
            Some(_) => {
                return Err(EmbeddingError::Malformed(format!("duplicate index {index}")));
            }
            None => {
                return Err(EmbeddingError::Malformed(format!(
                    "index {index} out of range for {count} items"
                )));
            }
        }
    }

    // Every slot is filled: `count` distinct indices below `count`.
    Ok(ordered.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_api_key_is_a_config_error() {
        let result = OpenAiEmbedder::new(OpenAiEmbedderConfig::new(""));
        assert!(matches!(result, Err(Error::Config(ConfigError::EmptyApiKey))));
    }

    fn item(index: Option<usize>, value: f64) -> EmbeddingData {
        EmbeddingData {
            embedding: vec![value],
            index,
        }
    }

    #[test]
    fn response_order_is_trusted_without_indices() {
        let ordered = order_by_index(vec![item(None, 1.0), item(None, 2.0)]).unwrap();
        assert_eq!(ordered, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn indices_restore_input_order() {
        let data = vec![item(Some(2), 3.0), item(Some(0), 1.0), item(Some(1), 2.0)];
        let ordered = order_by_index(data).unwrap();
        assert_eq!(ordered, vec![vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn indices_must_cover_every_position_once() {
        let duplicate = order_by_index(vec![item(Some(0), 1.0), item(Some(0), 2.0)]);
        assert!(matches!(duplicate, Err(EmbeddingError::Malformed(_))));

        let out_of_range = order_by_index(vec![item(Some(0), 1.0), item(Some(2), 2.0)]);
        assert!(matches!(out_of_range, Err(EmbeddingError::Malformed(_))));

        let partial = order_by_index(vec![item(Some(0), 1.0), item(None, 2.0)]);
        assert!(matches!(partial, Err(EmbeddingError::Malformed(_))));
    }

    #[test]
    fn defaults_fill_empty_fields() {
        let embedder = OpenAiEmbedder::new(OpenAiEmbedderConfig {
            base_url: String::new(),
            api_key: "sk-test".into(),
            model: String::new(),
            timeout: DEFAULT_TIMEOUT,
        })
        .unwrap();
        assert_eq!(embedder.endpoint, "https://api.openai.com/v1/embeddings");
        assert_eq!(embedder.model(), "text-embedding-3-small");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let mut config = OpenAiEmbedderConfig::new("sk-test");
        config.base_url = "http://localhost:8080/".into();
        let embedder = OpenAiEmbedder::new(config).unwrap();
        assert_eq!(embedder.endpoint, "http://localhost:8080/v1/embeddings");
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let config = OpenAiEmbedderConfig::new("sk-secret-value");
        assert!(!format!("{config:?}").contains("sk-secret"));
        let embedder = OpenAiEmbedder::new(config).unwrap();
        assert!(!format!("{embedder:?}").contains("sk-secret-value"));
    }

    #[tokio::test]
    async fn empty_input_skips_the_network() {
        // Port 9 (discard) is never contacted because no request is sent.
        let mut config = OpenAiEmbedderConfig::new("sk-test");
        config.base_url = "http://127.0.0.1:9".into();
        let embedder = OpenAiEmbedder::new(config).unwrap();
        let vectors = embedder.embed_text(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
