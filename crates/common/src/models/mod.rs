//! Fact corpus models
//!
//! A corpus is produced once per ingestion run and is read-only afterwards;
//! queries share it behind an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One atomic fact sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Position in the corpus (extraction order)
    pub index: usize,

    /// Normalized fact sentence
    pub text: String,
}

/// Ordered, capped sequence of facts from one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCorpus {
    /// Ingestion run identifier
    pub run_id: Uuid,

    /// Source document path, if the corpus came from a file
    pub source: Option<String>,

    /// When the corpus was built
    pub ingested_at: DateTime<Utc>,

    /// Facts in extraction order
    facts: Vec<Fact>,
}

impl FactCorpus {
    /// Build a corpus from fact sentences, keeping at most `max_facts`.
    ///
    /// Returns the corpus and the number of sentences dropped by the cap.
    pub fn from_sentences(
        sentences: Vec<String>,
        max_facts: usize,
        source: Option<String>,
    ) -> (Self, usize) {
        let total = sentences.len();
        let facts: Vec<Fact> = sentences
            .into_iter()
            .take(max_facts)
            .enumerate()
            .map(|(index, text)| Fact { index, text })
            .collect();
        let dropped = total - facts.len();

        (
            Self {
                run_id: Uuid::new_v4(),
                source,
                ingested_at: Utc::now(),
                facts,
            },
            dropped,
        )
    }

    /// Facts in extraction order
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Fact texts in extraction order
    pub fn texts(&self) -> Vec<String> {
        self.facts.iter().map(|f| f.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}
