//! Fact corpus with its document embeddings

use factrag_common::errors::{AppError, Result};
use factrag_common::{Embedder, FactCorpus};
use std::sync::Arc;
use tracing::{info, instrument};

/// A fact corpus embedded in document mode, one vector per fact.
///
/// Built once per ingestion and shared read-only between queries.
#[derive(Debug, Clone)]
pub struct EmbeddedCorpus {
    corpus: Arc<FactCorpus>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddedCorpus {
    /// Embed every fact of `corpus`
    #[instrument(skip_all, fields(facts = corpus.len(), model = embedder.model_name()))]
    pub async fn build(corpus: Arc<FactCorpus>, embedder: &dyn Embedder) -> Result<Self> {
        let vectors = if corpus.is_empty() {
            Vec::new()
        } else {
            embedder.embed_documents(&corpus.texts()).await?
        };

        if vectors.len() != corpus.len() {
            return Err(AppError::EmbeddingError {
                message: format!(
                    "Expected {} document embeddings, got {}",
                    corpus.len(),
                    vectors.len()
                ),
            });
        }

        info!("Fact corpus embedded");
        Ok(Self { corpus, vectors })
    }

    pub fn corpus(&self) -> &FactCorpus {
        &self.corpus
    }

    /// Document vectors in corpus order
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
