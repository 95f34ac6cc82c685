//! Application context shared by the commands
//!
//! Built once at startup from configuration: the selected parser, the
//! embedder and the answer generator.

use factrag_common::embeddings::create_embedder;
use factrag_common::generation::create_generator;
use factrag_common::{AppConfig, Embedder, FactCorpus, Generator};
use factrag_context::AnswerComposer;
use factrag_ingestion::{select_parser, IngestionProcessor};
use factrag_search::{EmbeddedCorpus, RetrievalParams, Retriever, ScoredFact};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct App {
    processor: IngestionProcessor,
    retriever: Retriever,
    composer: AnswerComposer,
}

/// Answer to one question with the facts it was grounded on
pub struct Answer {
    /// Every fact's similarity to the question, in corpus order
    pub scored: Vec<ScoredFact>,
    pub facts: Vec<ScoredFact>,
    pub text: String,
}

impl App {
    /// Connect to every external collaborator named in `config`
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let parser = select_parser(&config.parser).await?;
        let processor = IngestionProcessor::from_config(config, parser)?;

        let embedder: Arc<dyn Embedder> = create_embedder(&config.embedding)?;
        let generator: Arc<dyn Generator> = create_generator(&config.generation)?;
        info!(
            embedding_model = embedder.model_name(),
            generation_model = generator.model_name(),
            reformat = processor.reformats(),
            "Application ready"
        );

        Ok(Self {
            retriever: Retriever::new(embedder, RetrievalParams::from(&config.retrieval)),
            composer: AnswerComposer::new(generator),
            processor,
        })
    }

    pub async fn ingest(&self, pdf: &Path) -> anyhow::Result<Arc<FactCorpus>> {
        Ok(Arc::new(self.processor.process_pdf(pdf).await?))
    }

    pub async fn embed(&self, corpus: Arc<FactCorpus>) -> anyhow::Result<EmbeddedCorpus> {
        Ok(self.retriever.embed_corpus(corpus).await?)
    }

    pub async fn answer(&self, corpus: &EmbeddedCorpus, question: &str) -> anyhow::Result<Answer> {
        let retrieval = self.retriever.retrieve_scored(corpus, question).await?;
        let text = self.composer.compose(&retrieval.ranked, question).await?;
        Ok(Answer {
            scored: retrieval.scored,
            facts: retrieval.ranked,
            text,
        })
    }
}
