//! Embedding service abstraction
//!
//! Embeddings are asymmetric: corpus facts are embedded in
//! [`InputMode::Document`] mode and questions in [`InputMode::Query`] mode.
//! Providers:
//! - Cohere (`/v2/embed`, embed-v4.0 with configurable output dimension)
//! - Mock (deterministic per-text vectors for offline runs and tests)

use crate::config::EmbeddingConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::resilience::RetryPolicy;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

const COHERE_API_BASE: &str = "https://api.cohere.com";

/// Which side of the retrieval an input is embedded for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// Corpus content
    #[serde(rename = "search_document")]
    Document,
    /// Search question
    #[serde(rename = "search_query")]
    Query,
}

impl InputMode {
    /// Wire name used by the embedding API
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Document => "search_document",
            InputMode::Query => "search_query",
        }
    }
}

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embeddings for multiple texts in the given mode
    async fn embed_batch(&self, texts: &[String], mode: InputMode) -> Result<Vec<Vec<f32>>>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Embed corpus content (document mode)
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_batch(texts, InputMode::Document).await
    }

    /// Embed a single question (query mode)
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .embed_batch(&[text.to_string()], InputMode::Query)
            .await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::EmbeddingError {
                message: "Empty response".to_string(),
            })
    }
}

/// Cohere embedding client
pub struct CohereEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimension: usize,
    batch_size: usize,
    base_url: String,
    timeout_ms: u64,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct CohereEmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: InputMode,
    embedding_types: [&'static str; 1],
    output_dimension: usize,
}

#[derive(Deserialize)]
struct CohereEmbedResponse {
    embeddings: CohereEmbeddings,
}

#[derive(Deserialize)]
struct CohereEmbeddings {
    float: Vec<Vec<f32>>,
}

impl CohereEmbedder {
    /// Create a new Cohere embedder
    pub fn new(api_key: String, config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| COHERE_API_BASE.to_string()),
            timeout_ms: config.timeout().as_millis() as u64,
            retry: RetryPolicy::with_retries(config.max_retries),
        })
    }

    /// Override the retry schedule
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn make_request(&self, texts: &[String], mode: InputMode) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v2/embed", self.base_url.trim_end_matches('/'));

        let request = CohereEmbedRequest {
            model: &self.model,
            texts,
            input_type: mode,
            embedding_types: ["float"],
            output_dimension: self.dimension,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout {
                        service: "embedding".to_string(),
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    AppError::HttpClient(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                service: "embedding".to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        let result: CohereEmbedResponse =
            response.json().await.map_err(|e| AppError::EmbeddingError {
                message: format!("Failed to parse response: {}", e),
            })?;

        let embeddings = result.embeddings.float;
        if embeddings.len() != texts.len() {
            return Err(AppError::EmbeddingError {
                message: format!(
                    "Expected {} embeddings, received {}",
                    texts.len(),
                    embeddings.len()
                ),
            });
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(AppError::EmbeddingError {
                message: format!(
                    "Expected dimension {}, received {}",
                    self.dimension,
                    bad.len()
                ),
            });
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for CohereEmbedder {
    async fn embed_batch(&self, texts: &[String], mode: InputMode) -> Result<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let start = Instant::now();
            let result = self
                .retry
                .run("embedding", || self.make_request(chunk, mode))
                .await;
            metrics::record_embedding(
                start.elapsed().as_secs_f64(),
                &self.model,
                mode.as_str(),
                chunk.len(),
                result.is_ok(),
            );
            all_embeddings.extend(result?);
        }

        Ok(all_embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Mock embedder for offline runs and testing.
///
/// Vectors are seeded from the text, so equal texts always embed equally.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        (0..self.dimension).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_batch(&self, texts: &[String], _mode: InputMode) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "cohere" => {
            let key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
                message: "Cohere API key required (set COHERE_API or embedding.api_key)"
                    .to_string(),
            })?;
            Ok(Arc::new(CohereEmbedder::new(key, config)?))
        }
        "mock" => Ok(Arc::new(MockEmbedder::new(config.dimension))),
        other => Err(AppError::Configuration {
            message: format!("Unknown embedding provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(server_url: &str, dimension: usize, batch_size: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "cohere".to_string(),
            api_key: Some("test-key".to_string()),
            api_base: Some(server_url.to_string()),
            dimension,
            batch_size,
            max_retries: 1,
            ..EmbeddingConfig::default()
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_mock_embedder() {
        let embedder = MockEmbedder::new(1024);
        let embedding = embedder.embed_query("test text").await.unwrap();
        assert_eq!(embedding.len(), 1024);
    }

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let embedder = MockEmbedder::new(16);
        let texts = vec!["text1".to_string(), "text2".to_string(), "text1".to_string()];
        let embeddings = embedder.embed_documents(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert_eq!(embeddings[0], embeddings[2]);
        assert_ne!(embeddings[0], embeddings[1]);
    }

    #[test]
    fn test_input_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&InputMode::Document).unwrap(),
            "\"search_document\""
        );
        assert_eq!(InputMode::Query.as_str(), "search_query");
    }

    #[test]
    fn test_create_embedder_requires_key() {
        let config = EmbeddingConfig::default();
        assert!(matches!(
            create_embedder(&config),
            Err(AppError::Configuration { .. })
        ));

        let mock = EmbeddingConfig {
            provider: "mock".to_string(),
            ..EmbeddingConfig::default()
        };
        assert_eq!(create_embedder(&mock).unwrap().model_name(), "mock-embedding");
    }

    #[tokio::test]
    async fn test_cohere_query_mode_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/embed")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "embed-v4.0",
                "input_type": "search_query",
                "embedding_types": ["float"],
                "output_dimension": 3
            })))
            .with_status(200)
            .with_body(r#"{"embeddings":{"float":[[0.1,0.2,0.3]]}}"#)
            .create_async()
            .await;

        let embedder = CohereEmbedder::new("test-key".into(), &test_config(&server.url(), 3, 96))
            .unwrap();
        let vector = embedder.embed_query("What is a dog?").await.unwrap();

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cohere_batches_documents() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/embed")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "input_type": "search_document"
            })))
            .with_status(200)
            .with_body(r#"{"embeddings":{"float":[[1.0,0.0],[0.0,1.0]]}}"#)
            .expect(2)
            .create_async()
            .await;

        let embedder = CohereEmbedder::new("test-key".into(), &test_config(&server.url(), 2, 2))
            .unwrap();
        let texts: Vec<String> = (0..4).map(|i| format!("Fact {}.", i)).collect();
        let vectors = embedder.embed_documents(&texts).await.unwrap();

        assert_eq!(vectors.len(), 4);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cohere_dimension_mismatch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/embed")
            .with_status(200)
            .with_body(r#"{"embeddings":{"float":[[0.1,0.2]]}}"#)
            .create_async()
            .await;

        let embedder = CohereEmbedder::new("test-key".into(), &test_config(&server.url(), 3, 96))
            .unwrap();
        let err = embedder.embed_query("q").await.unwrap_err();
        assert!(matches!(err, AppError::EmbeddingError { .. }));
    }

    #[tokio::test]
    async fn test_cohere_server_errors_exhaust_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/embed")
            .with_status(503)
            .with_body("overloaded")
            .expect(2)
            .create_async()
            .await;

        let embedder = CohereEmbedder::new("test-key".into(), &test_config(&server.url(), 3, 96))
            .unwrap()
            .with_retry(fast_retry());
        let err = embedder.embed_query("q").await.unwrap_err();

        assert!(err.is_service_unavailable());
        mock.assert_async().await;
    }
}
