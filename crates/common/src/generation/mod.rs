//! Text generation service abstraction
//!
//! One prompt in, one completion out. Used for answer generation and for
//! the reformatting pass over raw PDF text.

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::resilience::RetryPolicy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

const COHERE_API_BASE: &str = "https://api.cohere.com";

/// Trait for prompt completion
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Cohere chat client (`/v2/chat`)
pub struct CohereGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    base_url: String,
    timeout_ms: u64,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl CohereGenerator {
    /// Create a new Cohere generator
    pub fn new(api_key: String, config: &GenerationConfig) -> Result<Self> {
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
            temperature: config.temperature,
            max_tokens: config.max_tokens,
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

    async fn make_request(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v2/chat", self.base_url.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
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
                        service: "generation".to_string(),
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
                service: "generation".to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| AppError::GenerationError {
            message: format!("Failed to parse response: {}", e),
        })?;

        let text: String = chat
            .message
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(AppError::GenerationError {
                message: "Empty response from model".to_string(),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl Generator for CohereGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let result = self
            .retry
            .run("generation", || self.make_request(prompt))
            .await;
        metrics::record_generation(start.elapsed().as_secs_f64(), &self.model, result.is_ok());
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock generator for offline runs and testing
pub struct MockGenerator;

impl MockGenerator {
    fn respond(prompt: &str) -> String {
        // First line of the context block, if any
        let context_line = prompt
            .split_once("Context:\n")
            .and_then(|(_, rest)| rest.lines().find(|l| !l.trim().is_empty()));

        match context_line {
            Some(line) => format!(
                "Based on the provided context: {} [Mock response - generation API key not configured]",
                line.trim()
            ),
            None => "[Mock response - generation API key not configured]".to_string(),
        }
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(Self::respond(prompt))
    }

    fn model_name(&self) -> &str {
        "mock-generation"
    }
}

/// Create a generator based on configuration
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "cohere" => {
            let key = config.api_key.clone().ok_or_else(|| AppError::Configuration {
                message: "Cohere API key required (set COHERE_API or generation.api_key)"
                    .to_string(),
            })?;
            Ok(Arc::new(CohereGenerator::new(key, config)?))
        }
        "mock" => Ok(Arc::new(MockGenerator)),
        other => Err(AppError::Configuration {
            message: format!("Unknown generation provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(server_url: &str) -> GenerationConfig {
        GenerationConfig {
            api_key: Some("test-key".to_string()),
            api_base: Some(server_url.to_string()),
            max_retries: 1,
            ..GenerationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_cohere_chat_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/chat")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "command-r-plus",
                "messages": [{"role": "user", "content": "Say hi"}],
                "max_tokens": 300
            })))
            .with_status(200)
            .with_body(
                r#"{"id":"x","finish_reason":"COMPLETE","message":{"role":"assistant","content":[{"type":"text","text":"Hi there."}]}}"#,
            )
            .create_async()
            .await;

        let generator = CohereGenerator::new("test-key".into(), &test_config(&server.url())).unwrap();
        let text = generator.generate("Say hi").await.unwrap();

        assert_eq!(text, "Hi there.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/chat")
            .with_status(401)
            .with_body(r#"{"message":"invalid api token"}"#)
            .expect(1)
            .create_async()
            .await;

        let generator = CohereGenerator::new("test-key".into(), &test_config(&server.url()))
            .unwrap()
            .with_retry(RetryPolicy {
                max_retries: 2,
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(1),
            });
        let err = generator.generate("Say hi").await.unwrap_err();

        assert!(matches!(err, AppError::Upstream { status: 401, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("POST", "/v2/chat")
            .with_status(429)
            .expect(2)
            .create_async()
            .await;

        let generator = CohereGenerator::new("test-key".into(), &test_config(&server.url()))
            .unwrap()
            .with_retry(RetryPolicy {
                max_retries: 1,
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(1),
            });
        let err = generator.generate("Say hi").await.unwrap_err();

        assert!(err.is_service_unavailable());
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_mock_generator_uses_context() {
        let prompt = "Answer.\n\nContext:\nThe dog chased the cat.\n\nQuestion:\nWho?\n\nAnswer:";
        let answer = MockGenerator.generate(prompt).await.unwrap();
        assert!(answer.contains("The dog chased the cat."));
    }
}
