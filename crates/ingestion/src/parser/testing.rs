//! Hand-built dependency trees for tests

use super::{Dep, DependencyParser, ParsedSentence, Pos, Token};
use crate::errors::{IngestionError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Word, POS, dependency label, head index
pub type Word<'a> = (&'a str, &'a str, &'a str, usize);

/// Build a sentence whose text is the words joined by single spaces
pub fn sentence(words: &[Word]) -> ParsedSentence {
    let mut offset = 0;
    let mut tokens = Vec::with_capacity(words.len());
    for &(text, pos, dep, head) in words {
        tokens.push(Token {
            text: text.to_string(),
            offset,
            pos: Pos::from(pos),
            dep: Dep::from(dep),
            head,
        });
        offset += text.chars().count() + 1;
    }
    let text = words.iter().map(|w| w.0).collect::<Vec<_>>().join(" ");
    ParsedSentence::new(text, tokens).expect("fixture heads are in range")
}

pub fn dog_cat_park() -> ParsedSentence {
    sentence(&[
        ("The", "DET", "det", 1),
        ("dog", "NOUN", "nsubj", 2),
        ("chased", "VERB", "ROOT", 2),
        ("the", "DET", "det", 4),
        ("cat", "NOUN", "dobj", 2),
        ("in", "ADP", "prep", 2),
        ("the", "DET", "det", 7),
        ("park", "NOUN", "pobj", 5),
        (".", "PUNCT", "punct", 2),
    ])
}

/// Answers with fixed trees keyed by the exact input text
#[derive(Default)]
pub struct FixtureParser {
    docs: HashMap<String, Vec<ParsedSentence>>,
    pub calls: AtomicUsize,
}

impl FixtureParser {
    /// Register each sentence on its own and the sentences joined by spaces
    pub fn with_sentences(sentences: Vec<ParsedSentence>) -> Self {
        let whole = sentences
            .iter()
            .map(|s| s.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        Self::default().with_document(&whole, sentences)
    }

    /// Register `text` as a document made of `sentences`
    pub fn with_document(mut self, text: &str, sentences: Vec<ParsedSentence>) -> Self {
        for s in &sentences {
            self.docs.insert(s.text.clone(), vec![s.clone()]);
        }
        self.docs.insert(text.to_string(), sentences);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DependencyParser for FixtureParser {
    async fn parse(&self, text: &str) -> Result<Vec<ParsedSentence>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.docs
            .get(text)
            .cloned()
            .ok_or_else(|| IngestionError::ParseError(format!("no fixture for {text:?}")))
    }

    fn model_name(&self) -> &str {
        "fixture"
    }
}
