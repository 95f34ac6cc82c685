//! Parser model selection at startup

use super::{DependencyParser, SpacyHttpParser};
use crate::errors::{IngestionError, Result};
use factrag_common::config::ParserConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Probe the configured models in order and keep the first that answers.
pub async fn select_parser(config: &ParserConfig) -> Result<Arc<dyn DependencyParser>> {
    let candidates = config
        .models
        .iter()
        .map(|model| {
            SpacyHttpParser::new(config, model).map(|p| Arc::new(p) as Arc<dyn DependencyParser>)
        })
        .collect::<Result<Vec<_>>>()?;

    select_first_available(candidates).await
}

/// Return the first candidate whose probe succeeds.
pub async fn select_first_available(
    candidates: Vec<Arc<dyn DependencyParser>>,
) -> Result<Arc<dyn DependencyParser>> {
    let mut tried = Vec::with_capacity(candidates.len());

    for parser in candidates {
        match parser.probe().await {
            Ok(()) => {
                info!(model = parser.model_name(), "Dependency parser selected");
                return Ok(parser);
            }
            Err(e) => {
                warn!(model = parser.model_name(), error = %e, "Parser model unavailable");
                tried.push(parser.model_name().to_string());
            }
        }
    }

    Err(IngestionError::ParserUnavailable { tried })
}
