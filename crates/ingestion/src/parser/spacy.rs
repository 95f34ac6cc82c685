//! HTTP client for a spaCy parse service
//!
//! The service takes `{"text", "model"}` on `POST /parse` and answers with
//! spaCy's `Doc.to_json()` document. Offsets in that document are character
//! offsets into `text`.

use super::{Dep, DependencyParser, ParsedSentence, Pos, Token};
use crate::errors::{IngestionError, Result};
use async_trait::async_trait;
use factrag_common::config::ParserConfig;
use factrag_common::errors::AppError;
use factrag_common::resilience::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct SpacyHttpParser {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout_ms: u64,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct DocJson {
    text: String,
    #[serde(default)]
    sents: Vec<SpanJson>,
    #[serde(default)]
    tokens: Vec<TokenJson>,
}

#[derive(Debug, Deserialize)]
struct SpanJson {
    start: usize,
    end: usize,
}

#[derive(Debug, Deserialize)]
struct TokenJson {
    id: usize,
    start: usize,
    end: usize,
    #[serde(default)]
    pos: String,
    #[serde(default)]
    dep: String,
    head: usize,
}

impl SpacyHttpParser {
    pub fn new(config: &ParserConfig, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout_ms: config.timeout().as_millis() as u64,
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry schedule
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, text: &str) -> std::result::Result<DocJson, AppError> {
        let url = format!("{}/parse", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ParseRequest {
                text,
                model: &self.model,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout {
                        service: "parser".to_string(),
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    AppError::HttpClient(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                service: "parser".to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        response.json::<DocJson>().await.map_err(|e| AppError::InvalidFormat {
            message: format!("Malformed parse document: {}", e),
        })
    }
}

#[async_trait]
impl DependencyParser for SpacyHttpParser {
    async fn parse(&self, text: &str) -> Result<Vec<ParsedSentence>> {
        let doc = self.retry.run("parser", || self.request(text)).await?;
        let sentences = sentences_from_doc(&doc)?;
        debug!(model = %self.model, sentences = sentences.len(), "Parsed text");
        Ok(sentences)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    /// Single request, no retries: a model that does not answer is skipped.
    async fn probe(&self) -> Result<()> {
        self.request("The parser is ready.").await?;
        Ok(())
    }
}

/// Split a spaCy document into sentence arenas with sentence-local heads and offsets.
fn sentences_from_doc(doc: &DocJson) -> Result<Vec<ParsedSentence>> {
    // Character index -> byte index, with one extra entry for the end
    let byte_at: Vec<usize> = doc
        .text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(doc.text.len()))
        .collect();
    let mut sentences = Vec::with_capacity(doc.sents.len());

    for sent in &doc.sents {
        let members: Vec<&TokenJson> = doc
            .tokens
            .iter()
            .filter(|t| t.start >= sent.start && t.end <= sent.end)
            .collect();
        let Some(first_id) = members.first().map(|t| t.id) else {
            continue;
        };

        let mut tokens = Vec::with_capacity(members.len());
        for t in &members {
            let head = t
                .head
                .checked_sub(first_id)
                .filter(|h| *h < members.len())
                .ok_or_else(|| {
                    IngestionError::ParseError(format!(
                        "token {} has head {} outside its sentence",
                        t.id, t.head
                    ))
                })?;
            tokens.push(Token {
                text: slice(&doc.text, &byte_at, t.start, t.end)?.to_string(),
                offset: t.start - sent.start,
                pos: Pos::from(t.pos.as_str()),
                dep: Dep::from(t.dep.as_str()),
                head,
            });
        }

        let text = slice(&doc.text, &byte_at, sent.start, sent.end)?.to_string();
        let sentence = ParsedSentence::new(text, tokens).ok_or_else(|| {
            IngestionError::ParseError("token head outside sentence".to_string())
        })?;
        sentences.push(sentence);
    }

    Ok(sentences)
}

/// Text between two character offsets
fn slice<'a>(text: &'a str, byte_at: &[usize], start: usize, end: usize) -> Result<&'a str> {
    match (byte_at.get(start), byte_at.get(end)) {
        (Some(&s), Some(&e)) if s <= e => Ok(&text[s..e]),
        _ => Err(IngestionError::ParseError(format!(
            "span {}..{} outside document text",
            start, end
        ))),
    }
}
