//! Embedder double with fixed vectors

use async_trait::async_trait;
use factrag_common::errors::{AppError, Result};
use factrag_common::{Embedder, InputMode};
use std::collections::HashMap;
use std::sync::Mutex;

/// Returns preset vectors and records the mode of every call
pub struct StaticEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    modes: Mutex<Vec<InputMode>>,
}

impl StaticEmbedder {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            modes: Mutex::new(Vec::new()),
        }
    }

    pub fn modes(&self) -> Vec<InputMode> {
        self.modes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed_batch(&self, texts: &[String], mode: InputMode) -> Result<Vec<Vec<f32>>> {
        self.modes.lock().unwrap().push(mode);
        texts
            .iter()
            .map(|t| {
                self.vectors.get(t).cloned().ok_or_else(|| AppError::EmbeddingError {
                    message: format!("no vector for {t:?}"),
                })
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        "static"
    }

    fn dimension(&self) -> usize {
        self.vectors.values().next().map_or(0, Vec::len)
    }
}
