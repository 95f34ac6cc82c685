//! Ingestion processor
//!
//! Core pipeline: PDF extraction, normalization, line unwrapping, optional
//! reformatting, decomposition into atomic facts, and the corpus cap.

use crate::decomposer::decompose;
use crate::errors::Result;
use crate::normalizer::{normalize, strip_page_separators, unwrap_lines};
use crate::parser::DependencyParser;
use crate::pdf::extract_text_from_pdf;
use crate::reformat::Reformatter;
use factrag_common::config::{AppConfig, IngestionConfig};
use factrag_common::generation::create_generator;
use factrag_common::{metrics, FactCorpus, Generator};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Ingestion processor
pub struct IngestionProcessor {
    parser: Arc<dyn DependencyParser>,
    reformatter: Option<Reformatter>,
    max_facts: usize,
    lowercase: bool,
}

impl IngestionProcessor {
    pub fn new(
        parser: Arc<dyn DependencyParser>,
        config: &IngestionConfig,
        reformat_generator: Option<Arc<dyn Generator>>,
    ) -> Self {
        let reformatter = reformat_generator
            .filter(|_| config.reformat.enabled)
            .map(|generator| Reformatter::new(generator, &config.reformat));

        Self {
            parser,
            reformatter,
            max_facts: config.max_facts,
            lowercase: config.lowercase,
        }
    }

    /// Build a processor from application config, creating the reformatting
    /// generator when reformatting is enabled.
    pub fn from_config(config: &AppConfig, parser: Arc<dyn DependencyParser>) -> Result<Self> {
        let reformat = &config.ingestion.reformat;

        let generator = if !reformat.enabled {
            None
        } else if config.generation.provider == "mock" {
            info!("Mock generation provider configured, reformatting disabled");
            None
        } else {
            Some(create_generator(&config.reformat_generation())?)
        };

        Ok(Self::new(parser, &config.ingestion, generator))
    }

    /// Extract a PDF and turn it into a fact corpus
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn process_pdf(&self, path: &Path) -> Result<FactCorpus> {
        info!("Processing PDF");

        let raw = extract_text_from_pdf(path)?;
        self.process_text(&raw, Some(path.display().to_string()))
            .await
    }

    /// Turn sentinel-delimited document text into a fact corpus
    #[instrument(skip(self, raw), fields(chars = raw.len()))]
    pub async fn process_text(&self, raw: &str, source: Option<String>) -> Result<FactCorpus> {
        let start = Instant::now();

        let mut normalized = normalize(raw);
        if self.lowercase {
            normalized = normalized.to_lowercase();
        }
        let normalized = unwrap_lines(&normalized);
        debug!(chars = normalized.len(), "Text normalized");

        let formatted = match &self.reformatter {
            Some(reformatter) => reformatter.reformat(&normalized).await?,
            None => normalized,
        };

        let sentences = decompose(&strip_page_separators(&formatted), self.parser.as_ref()).await?;
        let extracted = sentences.len();

        let (corpus, dropped) = FactCorpus::from_sentences(sentences, self.max_facts, source);
        if dropped > 0 {
            warn!(
                dropped,
                max_facts = self.max_facts,
                "Fact corpus capped, later facts discarded"
            );
        }

        metrics::record_ingestion(start.elapsed().as_secs_f64(), extracted, corpus.len());
        info!(
            run_id = %corpus.run_id,
            facts = corpus.len(),
            extracted,
            "Ingestion complete"
        );

        Ok(corpus)
    }

    pub fn reformats(&self) -> bool {
        self.reformatter.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IngestionError;
    use crate::parser::testing::{dog_cat_park, sentence, FixtureParser};
    use async_trait::async_trait;

    struct EchoGenerator(&'static str);

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, _prompt: &str) -> factrag_common::Result<String> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn cats_love_fish() -> crate::parser::ParsedSentence {
        sentence(&[
            ("Cats", "NOUN", "nsubj", 1),
            ("love", "VERB", "ROOT", 1),
            ("fish", "NOUN", "dobj", 1),
            (".", "PUNCT", "punct", 1),
        ])
    }

    #[tokio::test]
    async fn test_process_text_pages() {
        let parser = FixtureParser::default().with_document(
            "The dog chased the cat in the park .\n\nCats love fish .",
            vec![dog_cat_park(), cats_love_fish()],
        );
        let processor =
            IngestionProcessor::new(Arc::new(parser), &IngestionConfig::default(), None);

        let corpus = processor
            .process_text(
                "The dog chased the cat in the park .\n-----\nCats love fish .",
                Some("doc.pdf".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(
            corpus.texts(),
            vec![
                "The dog chased the cat.",
                "The dog chased in the park.",
                "Cats love fish."
            ]
        );
        assert_eq!(corpus.facts()[2].index, 2);
        assert_eq!(corpus.source.as_deref(), Some("doc.pdf"));
    }

    #[tokio::test]
    async fn test_lowercase_after_footnotes_and_merge() {
        let parser = FixtureParser::with_sentences(vec![sentence(&[
            ("cats", "NOUN", "nsubj", 1),
            ("love", "VERB", "ROOT", 1),
            ("fish", "NOUN", "dobj", 1),
            (".", "PUNCT", "punct", 1),
        ])]);
        let config = IngestionConfig {
            lowercase: true,
            ..IngestionConfig::default()
        };
        let processor = IngestionProcessor::new(Arc::new(parser), &config, None);

        // The footnote is matched before lowercasing, so the pages still merge
        let corpus = processor
            .process_text("Cats love\n3See the Appendix\n-----\nfish .", None)
            .await
            .unwrap();

        assert_eq!(corpus.texts(), vec!["Cats love fish."]);
    }

    #[tokio::test]
    async fn test_corpus_capped() {
        let parser = FixtureParser::with_sentences(vec![dog_cat_park()]);
        let config = IngestionConfig {
            max_facts: 1,
            ..IngestionConfig::default()
        };
        let processor = IngestionProcessor::new(Arc::new(parser), &config, None);

        let corpus = processor
            .process_text("The dog chased the cat in the park .", None)
            .await
            .unwrap();

        assert_eq!(corpus.texts(), vec!["The dog chased the cat."]);
    }

    #[tokio::test]
    async fn test_reformatted_text_is_decomposed() {
        let parser = FixtureParser::with_sentences(vec![cats_love_fish()]);
        let processor = IngestionProcessor::new(
            Arc::new(parser),
            &IngestionConfig::default(),
            Some(Arc::new(EchoGenerator("Cats love fish ."))),
        );
        assert!(processor.reformats());

        let corpus = processor
            .process_text("Catslove fish .", None)
            .await
            .unwrap();

        assert_eq!(corpus.texts(), vec!["Cats love fish."]);
    }

    #[tokio::test]
    async fn test_reformat_disabled_ignores_generator() {
        let mut config = IngestionConfig::default();
        config.reformat.enabled = false;
        let processor = IngestionProcessor::new(
            Arc::new(FixtureParser::default()),
            &config,
            Some(Arc::new(EchoGenerator("unused"))),
        );
        assert!(!processor.reformats());
    }

    #[tokio::test]
    async fn test_empty_document_yields_empty_corpus() {
        let parser = Arc::new(FixtureParser::default());
        let processor = IngestionProcessor::new(parser, &IngestionConfig::default(), None);

        let corpus = processor.process_text("\n-----\n  ", None).await.unwrap();
        assert!(corpus.is_empty());
    }

    #[tokio::test]
    async fn test_mock_provider_skips_reformatting() {
        let mut config = AppConfig::default();
        config.generation.provider = "mock".to_string();

        let processor =
            IngestionProcessor::from_config(&config, Arc::new(FixtureParser::default())).unwrap();
        assert!(!processor.reformats());
    }

    #[tokio::test]
    async fn test_missing_pdf() {
        let processor = IngestionProcessor::new(
            Arc::new(FixtureParser::default()),
            &IngestionConfig::default(),
            None,
        );
        let err = processor
            .process_pdf(Path::new("/nonexistent/book.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::FileNotFound(_)));
    }
}
