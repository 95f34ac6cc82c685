//! FactRAG Common Library
//!
//! Shared code for all FactRAG crates including:
//! - Configuration management
//! - Error types and handling
//! - Embedding client abstraction (document / query modes)
//! - Text generation client abstraction
//! - Retry with backoff for external services
//! - Fact corpus models
//! - Metrics

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod generation;
pub mod metrics;
pub mod models;
pub mod resilience;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::{Embedder, InputMode};
pub use errors::{AppError, Result};
pub use generation::Generator;
pub use models::{Fact, FactCorpus};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "embed-v4.0";

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;

/// Fixed answer when no fact clears the relevance threshold
pub const FALLBACK_ANSWER: &str = "I don't know.";
