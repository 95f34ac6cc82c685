//! Configuration management for FactRAG
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values
//!
//! `COHERE_API` is accepted as the API key for both Cohere clients when no
//! key is configured explicitly.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::errors::Result;

/// Environment variable holding the Cohere API key
pub const COHERE_API_KEY_ENV: &str = "COHERE_API";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    /// Embedding service configuration
    #[serde(default)]
    #[validate(nested)]
    pub embedding: EmbeddingConfig,

    /// Answer generation configuration
    #[serde(default)]
    #[validate(nested)]
    pub generation: GenerationConfig,

    /// Dependency parser configuration
    #[serde(default)]
    #[validate(nested)]
    pub parser: ParserConfig,

    /// Ingestion pipeline configuration
    #[serde(default)]
    #[validate(nested)]
    pub ingestion: IngestionConfig,

    /// Retrieval configuration
    #[serde(default)]
    #[validate(nested)]
    pub retrieval: RetrievalConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct EmbeddingConfig {
    /// Embedding provider: cohere, mock
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension, fixed for the whole run
    #[serde(default = "default_embedding_dimension")]
    #[validate(range(min = 1))]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Batch size for embedding requests
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1))]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GenerationConfig {
    /// Generation provider: cohere, mock
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for generation service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_generation_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,

    /// Maximum output tokens
    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1))]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ParserConfig {
    /// Base URL of the dependency parse service
    #[serde(default = "default_parser_url")]
    pub base_url: String,

    /// Candidate models, most capable first
    #[serde(default = "default_parser_models")]
    #[validate(length(min = 1))]
    pub models: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "default_parser_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct IngestionConfig {
    /// Maximum number of facts kept in the corpus
    #[serde(default = "default_max_facts")]
    #[validate(range(min = 1))]
    pub max_facts: usize,

    /// Lowercase the text once footnotes and page breaks are reconciled
    #[serde(default)]
    pub lowercase: bool,

    /// Reformatting of raw PDF text through the generation service
    #[serde(default)]
    #[validate(nested)]
    pub reformat: ReformatConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ReformatConfig {
    /// Enable the reformatting pass
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Model used for reformatting
    #[serde(default = "default_reformat_model")]
    pub model: String,

    /// Sampling temperature for reformatting
    #[serde(default)]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,

    /// Attempts before the exhaustion policy applies
    #[serde(default = "default_reformat_attempts")]
    #[validate(range(min = 1))]
    pub max_attempts: u32,

    /// What to do once every attempt failed the alphanumeric check
    #[serde(default)]
    pub on_exhausted: ExhaustedPolicy,
}

/// Outcome once reformatting attempts run out
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustedPolicy {
    /// Keep the page as extracted
    #[default]
    UseRaw,
    /// Abort ingestion
    Fail,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a fact to be used
    #[serde(default = "default_threshold")]
    #[validate(range(min = -1.0, max = 1.0))]
    pub threshold: f32,

    /// Number of facts passed to the generator
    #[serde(default = "default_top_k")]
    #[validate(range(min = 1))]
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level filter (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,
}

// Default value functions
fn default_provider() -> String { "cohere".to_string() }
fn default_embedding_model() -> String { crate::DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_embedding_dimension() -> usize { crate::DEFAULT_EMBEDDING_DIMENSION }
fn default_embedding_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 2 }
fn default_batch_size() -> usize { 96 }
fn default_generation_model() -> String { "command-r-plus".to_string() }
fn default_generation_temperature() -> f32 { 0.3 }
fn default_max_tokens() -> u32 { 300 }
fn default_generation_timeout() -> u64 { 60 }
fn default_parser_url() -> String { "http://localhost:8080".to_string() }
fn default_parser_models() -> Vec<String> {
    vec![
        "en_core_web_lg".to_string(),
        "en_core_web_md".to_string(),
        "en_core_web_sm".to_string(),
    ]
}
fn default_parser_timeout() -> u64 { 30 }
fn default_max_facts() -> usize { 96 }
fn default_enabled() -> bool { true }
fn default_reformat_model() -> String { "command-a-03-2025".to_string() }
fn default_reformat_attempts() -> u32 { 3 }
fn default_threshold() -> f32 { 0.70 }
fn default_top_k() -> usize { 2 }
fn default_log_level() -> String { "info".to_string() }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_max_retries(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_base: None,
            model: default_generation_model(),
            temperature: default_generation_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: default_parser_url(),
            models: default_parser_models(),
            timeout_secs: default_parser_timeout(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_facts: default_max_facts(),
            lowercase: false,
            reformat: ReformatConfig::default(),
        }
    }
}

impl Default for ReformatConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            model: default_reformat_model(),
            temperature: 0.0,
            max_attempts: default_reformat_attempts(),
            on_exhausted: ExhaustedPolicy::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            top_k: default_top_k(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            parser: ParserConfig::default(),
            ingestion: IngestionConfig::default(),
            retrieval: RetrievalConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__RETRIEVAL__TOP_K=3
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(config)
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let mut app: AppConfig = config.try_deserialize()?;
        app.apply_key_fallback(std::env::var(COHERE_API_KEY_ENV).ok());
        app.validate()?;
        Ok(app)
    }

    /// Fill missing API keys from the shared Cohere key
    pub fn apply_key_fallback(&mut self, key: Option<String>) {
        let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
            return;
        };
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = Some(key.clone());
        }
        if self.generation.api_key.is_none() {
            self.generation.api_key = Some(key);
        }
    }

    /// Generation settings for the reformatting pass: same provider and
    /// credentials as answer generation, with the reformat model and temperature.
    pub fn reformat_generation(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.ingestion.reformat.model.clone(),
            temperature: self.ingestion.reformat.temperature,
            // Reformatted text must hold a whole page
            max_tokens: self.generation.max_tokens.max(4096),
            ..self.generation.clone()
        }
    }
}

impl EmbeddingConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GenerationConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ParserConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
