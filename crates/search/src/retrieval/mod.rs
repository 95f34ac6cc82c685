//! Embedding retrieval over a fact corpus
//!
//! Facts are embedded in document mode once; each question is embedded in
//! query mode and compared with every fact by cosine similarity. Facts
//! under the threshold are discarded, the rest sorted best first (ties keep
//! corpus order) and cut to `top_k`.

mod corpus;
mod similarity;
#[cfg(test)]
mod testing;

pub use corpus::EmbeddedCorpus;
pub use similarity::cosine_similarity;

use factrag_common::config::RetrievalConfig;
use factrag_common::errors::Result;
use factrag_common::{metrics, Embedder, Fact, FactCorpus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Fact with its similarity to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFact {
    pub fact: Fact,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalParams {
    /// Minimum cosine similarity, inclusive
    pub threshold: f32,
    /// Maximum facts returned
    pub top_k: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        RetrievalParams::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for RetrievalParams {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            threshold: config.threshold,
            top_k: config.top_k,
        }
    }
}

/// Score every fact against a query vector, in corpus order
pub fn score_all(corpus: &EmbeddedCorpus, query: &[f32]) -> Result<Vec<ScoredFact>> {
    corpus
        .corpus()
        .facts()
        .iter()
        .zip(corpus.vectors())
        .map(|(fact, vector)| {
            Ok(ScoredFact {
                fact: fact.clone(),
                score: cosine_similarity(vector, query)?,
            })
        })
        .collect()
}

/// Threshold filter, stable descending sort, top-k cut
pub fn rank(scored: Vec<ScoredFact>, params: RetrievalParams) -> Vec<ScoredFact> {
    let mut kept: Vec<ScoredFact> = scored
        .into_iter()
        .filter(|s| s.score >= params.threshold)
        .collect();
    kept.sort_by(|a, b| b.score.total_cmp(&a.score));
    kept.truncate(params.top_k);
    kept
}

/// Scores of every fact and the ranked cut, from one query embedding
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    /// Every fact in corpus order
    pub scored: Vec<ScoredFact>,
    /// Facts that cleared the threshold, best first
    pub ranked: Vec<ScoredFact>,
}

/// Embed `query` once, score every fact of `corpus` and rank them
pub async fn retrieve_scored(
    corpus: &EmbeddedCorpus,
    query: &str,
    embedder: &dyn Embedder,
    params: RetrievalParams,
) -> Result<Retrieval> {
    let start = Instant::now();

    let query_vector = embedder.embed_query(query).await?;
    let scored = score_all(corpus, &query_vector)?;
    let ranked = rank(scored.clone(), params);

    metrics::record_retrieval(start.elapsed().as_secs_f64(), corpus.len(), ranked.len());
    debug!(
        candidates = corpus.len(),
        returned = ranked.len(),
        threshold = params.threshold,
        "Facts retrieved"
    );
    Ok(Retrieval { scored, ranked })
}

/// Embed `query` and return the best facts of `corpus`
pub async fn retrieve(
    corpus: &EmbeddedCorpus,
    query: &str,
    embedder: &dyn Embedder,
    params: RetrievalParams,
) -> Result<Vec<ScoredFact>> {
    Ok(retrieve_scored(corpus, query, embedder, params).await?.ranked)
}

/// Retriever bound to an embedder and retrieval parameters
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    params: RetrievalParams,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, params: RetrievalParams) -> Self {
        Self { embedder, params }
    }

    pub fn params(&self) -> RetrievalParams {
        self.params
    }

    /// Embed a corpus for later queries
    pub async fn embed_corpus(&self, corpus: Arc<FactCorpus>) -> Result<EmbeddedCorpus> {
        EmbeddedCorpus::build(corpus, self.embedder.as_ref()).await
    }

    #[instrument(skip(self, corpus), fields(facts = corpus.len()))]
    pub async fn retrieve(&self, corpus: &EmbeddedCorpus, query: &str) -> Result<Vec<ScoredFact>> {
        retrieve(corpus, query, self.embedder.as_ref(), self.params).await
    }

    /// Ranked facts plus the score of every fact, with a single query embedding
    #[instrument(skip(self, corpus), fields(facts = corpus.len()))]
    pub async fn retrieve_scored(&self, corpus: &EmbeddedCorpus, query: &str) -> Result<Retrieval> {
        retrieve_scored(corpus, query, self.embedder.as_ref(), self.params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::testing::StaticEmbedder;
    use factrag_common::InputMode;

    /// Unit vector whose cosine with [1, 0] is `s`
    fn at(s: f32) -> Vec<f32> {
        vec![s, (1.0 - s * s).sqrt()]
    }

    fn scored(scores: &[f32]) -> Vec<ScoredFact> {
        scores
            .iter()
            .enumerate()
            .map(|(index, &score)| ScoredFact {
                fact: Fact {
                    index,
                    text: format!("Fact {index}."),
                },
                score,
            })
            .collect()
    }

    async fn fixture() -> (EmbeddedCorpus, Arc<StaticEmbedder>) {
        let facts = ["The dog chased the cat.", "The sky is blue.", "The dog chased in the park."];
        let (corpus, _) =
            FactCorpus::from_sentences(facts.iter().map(|f| f.to_string()).collect(), 96, None);
        let embedder = Arc::new(StaticEmbedder::new(&[
            (facts[0], at(0.9)),
            (facts[1], at(0.5)),
            (facts[2], at(0.75)),
            ("What did the dog chase?", vec![1.0, 0.0]),
        ]));
        let embedded = EmbeddedCorpus::build(Arc::new(corpus), embedder.as_ref())
            .await
            .unwrap();
        (embedded, embedder)
    }

    #[tokio::test]
    async fn test_threshold_and_order() {
        let (corpus, embedder) = fixture().await;
        let retriever = Retriever::new(embedder.clone(), RetrievalParams::default());

        let results = retriever
            .retrieve(&corpus, "What did the dog chase?")
            .await
            .unwrap();

        let indices: Vec<usize> = results.iter().map(|r| r.fact.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert!((results[0].score - 0.9).abs() < 1e-5);
        assert!((results[1].score - 0.75).abs() < 1e-5);
        assert_eq!(embedder.modes(), vec![InputMode::Document, InputMode::Query]);
    }

    #[tokio::test]
    async fn test_top_k_cut() {
        let (corpus, embedder) = fixture().await;
        let params = RetrievalParams {
            threshold: 0.0,
            top_k: 1,
        };

        let results = retrieve(&corpus, "What did the dog chase?", embedder.as_ref(), params)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fact.text, "The dog chased the cat.");
    }

    #[tokio::test]
    async fn test_nothing_above_threshold() {
        let (corpus, embedder) = fixture().await;
        let params = RetrievalParams {
            threshold: 0.95,
            top_k: 2,
        };
        let results = retrieve(&corpus, "What did the dog chase?", embedder.as_ref(), params)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_scored_retrieval_embeds_query_once() {
        let (corpus, embedder) = fixture().await;
        let retriever = Retriever::new(embedder.clone(), RetrievalParams::default());

        let retrieval = retriever
            .retrieve_scored(&corpus, "What did the dog chase?")
            .await
            .unwrap();

        let all: Vec<usize> = retrieval.scored.iter().map(|s| s.fact.index).collect();
        let top: Vec<usize> = retrieval.ranked.iter().map(|s| s.fact.index).collect();
        assert_eq!(all, vec![0, 1, 2]);
        assert!((retrieval.scored[1].score - 0.5).abs() < 1e-5);
        assert_eq!(top, vec![0, 2]);
        assert_eq!(embedder.modes(), vec![InputMode::Document, InputMode::Query]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let params = RetrievalParams {
            threshold: 0.7,
            top_k: 5,
        };
        assert_eq!(rank(scored(&[0.7, 0.69]), params).len(), 1);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let params = RetrievalParams {
            threshold: 0.5,
            top_k: 3,
        };
        let ranked = rank(scored(&[0.8, 0.9, 0.8, 0.8]), params);
        let indices: Vec<usize> = ranked.iter().map(|r| r.fact.index).collect();
        assert_eq!(indices, vec![1, 0, 2]);
    }

    #[test]
    fn test_defaults() {
        let params = RetrievalParams::default();
        assert_eq!(params.top_k, 2);
        assert!((params.threshold - 0.70).abs() < f32::EPSILON);
    }
}
