//! Dependency parsing
//!
//! A parse is an arena of tokens per sentence. Each token points at its head
//! by index; the root points at itself. Child lists are derived once when
//! the sentence is built.

pub mod select;
pub mod spacy;
#[cfg(test)]
pub(crate) mod testing;

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use select::{select_first_available, select_parser};
pub use spacy::SpacyHttpParser;

/// Coarse part-of-speech classes the decomposer distinguishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pos {
    Verb,
    Aux,
    Adp,
    Other(String),
}

impl From<&str> for Pos {
    fn from(tag: &str) -> Self {
        match tag {
            "VERB" => Pos::Verb,
            "AUX" => Pos::Aux,
            "ADP" => Pos::Adp,
            other => Pos::Other(other.to_string()),
        }
    }
}

/// Dependency labels the decomposer distinguishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dep {
    Nsubj,
    NsubjPass,
    Aux,
    AuxPass,
    Neg,
    Prt,
    Dobj,
    Pobj,
    Attr,
    /// Indirect object; spaCy's English models label it `dative`
    Iobj,
    Prep,
    Punct,
    Other(String),
}

impl From<&str> for Dep {
    fn from(label: &str) -> Self {
        match label {
            "nsubj" => Dep::Nsubj,
            "nsubjpass" => Dep::NsubjPass,
            "aux" => Dep::Aux,
            "auxpass" => Dep::AuxPass,
            "neg" => Dep::Neg,
            "prt" => Dep::Prt,
            "dobj" => Dep::Dobj,
            "pobj" => Dep::Pobj,
            "attr" => Dep::Attr,
            "iobj" | "dative" => Dep::Iobj,
            "prep" => Dep::Prep,
            "punct" => Dep::Punct,
            other => Dep::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text
    pub text: String,
    /// Character offset within the sentence
    pub offset: usize,
    pub pos: Pos,
    pub dep: Dep,
    /// Index of the head token in the same sentence
    pub head: usize,
}

/// One sentence and its dependency tree
#[derive(Debug, Clone)]
pub struct ParsedSentence {
    pub text: String,
    tokens: Vec<Token>,
    children: Vec<Vec<usize>>,
}

impl ParsedSentence {
    /// Build a sentence from tokens whose heads index into `tokens`.
    ///
    /// Returns `None` if a head index is out of range.
    pub fn new(text: impl Into<String>, tokens: Vec<Token>) -> Option<Self> {
        let mut children = vec![Vec::new(); tokens.len()];
        for (i, token) in tokens.iter().enumerate() {
            if token.head >= tokens.len() {
                return None;
            }
            if token.head != i {
                children[token.head].push(i);
            }
        }

        Some(Self {
            text: text.into(),
            tokens,
            children,
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> &Token {
        &self.tokens[index]
    }

    /// Direct children in token order
    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    /// Whole subtree of `index`, including it, in visit order
    pub fn subtree(&self, index: usize) -> Vec<usize> {
        self.subtree_with(index, |_, _| true)
    }

    /// Subtree of `index`, entering a child only when `descend(parent, child)`
    /// holds. A rejected child's whole branch is skipped.
    pub fn subtree_with(&self, index: usize, descend: impl Fn(usize, usize) -> bool) -> Vec<usize> {
        let mut out = Vec::new();
        let mut seen = vec![false; self.tokens.len()];
        let mut stack = vec![index];
        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut seen[node], true) {
                continue;
            }
            out.push(node);
            stack.extend(
                self.children[node]
                    .iter()
                    .rev()
                    .filter(|&&child| descend(node, child)),
            );
        }
        out
    }
}

/// Grammar parser producing dependency trees
#[async_trait]
pub trait DependencyParser: Send + Sync {
    /// Split `text` into sentences and parse each one
    async fn parse(&self, text: &str) -> Result<Vec<ParsedSentence>>;

    /// Model backing this parser
    fn model_name(&self) -> &str;

    /// Check that the parser answers
    async fn probe(&self) -> Result<()> {
        self.parse("The parser is ready.").await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, offset: usize, head: usize, dep: &str) -> Token {
        Token {
            text: text.to_string(),
            offset,
            pos: Pos::from("X"),
            dep: Dep::from(dep),
            head,
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Dep::from("dative"), Dep::Iobj);
        assert_eq!(Dep::from("ROOT"), Dep::Other("ROOT".into()));
        assert_eq!(Pos::from("AUX"), Pos::Aux);
    }

    #[test]
    fn test_children_and_subtree() {
        // Dogs(0) <- bark(1) -> loudly(2)
        let s = ParsedSentence::new(
            "Dogs bark loudly",
            vec![
                token("Dogs", 0, 1, "nsubj"),
                token("bark", 5, 1, "ROOT"),
                token("loudly", 10, 1, "advmod"),
            ],
        )
        .unwrap();

        assert_eq!(s.children(1), &[0, 2]);
        assert!(s.children(0).is_empty());
        assert_eq!(s.subtree(1), vec![1, 0, 2]);
    }

    #[test]
    fn test_invalid_head_rejected() {
        assert!(ParsedSentence::new("x", vec![token("x", 0, 3, "ROOT")]).is_none());
    }
}
