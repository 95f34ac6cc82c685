//! Answer composer
//!
//! One generator call per answered question. An empty retrieval never
//! reaches the generator.

use crate::prompt::build_prompt;
use factrag_common::errors::Result;
use factrag_common::{Generator, FALLBACK_ANSWER};
use factrag_search::ScoredFact;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Compose an answer to `query` from `retrieved` facts, in the given order
pub async fn compose(
    retrieved: &[ScoredFact],
    query: &str,
    generator: &dyn Generator,
) -> Result<String> {
    if retrieved.is_empty() {
        debug!("No fact cleared the threshold, answering with fallback");
        return Ok(FALLBACK_ANSWER.to_string());
    }

    let prompt = build_prompt(retrieved.iter().map(|s| s.fact.text.as_str()), query);
    let answer = generator.generate(&prompt).await?;

    Ok(answer.trim().to_string())
}

pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    #[instrument(skip(self, retrieved), fields(facts = retrieved.len(), model = self.generator.model_name()))]
    pub async fn compose(&self, retrieved: &[ScoredFact], query: &str) -> Result<String> {
        compose(retrieved, query, self.generator.as_ref()).await
    }
}
