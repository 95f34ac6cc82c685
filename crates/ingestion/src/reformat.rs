//! Generative cleanup of raw PDF text
//!
//! A page is sent to the generator with strict formatting instructions. The
//! reply is accepted only if it keeps the exact sequence of ASCII letters and
//! digits of the input.

use crate::errors::{IngestionError, Result};
use crate::normalizer::{split_pages, PAGE_SEPARATOR};
use factrag_common::config::{ExhaustedPolicy, ReformatConfig};
use factrag_common::metrics;
use factrag_common::Generator;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const REFORMAT_PROMPT: &str = r#"You are a strict text formatting assistant specializing in cleaning up messy PDF extractions.

You are given raw text extracted from a PDF.
The text contains these common PDF extraction issues:
- Words stuck together without spaces (like "Thischapterintroduces")
- Words broken across lines with hyphens (like "build-\ning")
- Incorrect line breaks in the middle of sentences
- Strange spacing or formatting issues
- Mathematical notation and symbols that need preservation
- Footnotes and references that need proper formatting

**Your task is to ONLY fix formatting issues:**
1. Separate words that are incorrectly joined (e.g., "Thischapter" -> "This chapter")
2. Rejoin words that are incorrectly hyphenated across lines (e.g., "build-\ning" -> "building")
3. Fix paragraph breaks and line spacing
4. Preserve all mathematical notations, symbols, and special characters
5. Maintain chapter headings, section numbers, and document structure

**STRICT RULES YOU MUST FOLLOW:**
- You must NOT change ANY alphanumeric characters - all letters and numbers must remain exactly the same
- You must NOT add, remove, or reorder any content
- You must NOT summarize or paraphrase
- You must NOT add any introductions, notes, explanations, or commentary
- You must NOT add "---", "**Note:**", or any similar text
- Start your output immediately with the cleaned text itself
- Return ONLY the cleaned version of the input text, nothing else

**CRITICAL CONSTRAINT:**
The sequence of all alphanumeric characters (A-Z, a-z, 0-9) must be EXACTLY identical between your output and the input.
This means that if someone were to remove all spaces, punctuation, and special characters from both texts,
they would get the exact same string of letters and numbers.

Here is the raw text:

{raw_text}
"#;

/// Result of the bounded attempts on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReformatOutcome {
    Accepted { text: String, attempts: u32 },
    Exhausted { attempts: u32 },
}

pub struct Reformatter {
    generator: Arc<dyn Generator>,
    max_attempts: u32,
    on_exhausted: ExhaustedPolicy,
}

impl Reformatter {
    pub fn new(generator: Arc<dyn Generator>, config: &ReformatConfig) -> Self {
        Self {
            generator,
            max_attempts: config.max_attempts.max(1),
            on_exhausted: config.on_exhausted,
        }
    }

    /// Reformat sentinel-delimited text page by page.
    #[instrument(skip_all, fields(model = self.generator.model_name()))]
    pub async fn reformat(&self, text: &str) -> Result<String> {
        let pages = split_pages(text);
        let mut out = Vec::with_capacity(pages.len());

        for (page, raw) in pages.iter().enumerate() {
            if raw.trim().is_empty() {
                out.push(raw.clone());
                continue;
            }
            let cleaned = match self.reformat_page(raw).await? {
                ReformatOutcome::Accepted { text, attempts } => {
                    debug!(page, attempts, "Page reformatted");
                    text
                }
                ReformatOutcome::Exhausted { attempts } => match self.on_exhausted {
                    ExhaustedPolicy::UseRaw => {
                        warn!(page, attempts, "Reformatting kept diverging, using raw page text");
                        raw.clone()
                    }
                    ExhaustedPolicy::Fail => {
                        return Err(IngestionError::ReformatMismatch { attempts });
                    }
                },
            };
            out.push(cleaned);
        }

        info!(pages = pages.len(), "Reformatting complete");
        Ok(out.join(PAGE_SEPARATOR))
    }

    /// Ask for a cleaned page until the reply is alphanumerically equivalent
    /// or the attempts run out. Generator failures end the loop immediately.
    pub async fn reformat_page(&self, raw: &str) -> Result<ReformatOutcome> {
        let prompt = REFORMAT_PROMPT.replace("{raw_text}", raw);

        for attempt in 1..=self.max_attempts {
            let candidate = self.generator.generate(&prompt).await?;
            if is_alphanumeric_equivalent(raw, &candidate) {
                return Ok(ReformatOutcome::Accepted {
                    text: candidate,
                    attempts: attempt,
                });
            }
            metrics::record_reformat_mismatch();
            debug!(attempt, max_attempts = self.max_attempts, "Reformatted text diverged");
        }

        Ok(ReformatOutcome::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Keep only ASCII letters and digits
pub fn alphanumeric_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_alphanumeric).collect()
}

pub fn is_alphanumeric_equivalent(a: &str, b: &str) -> bool {
    alphanumeric_only(a) == alphanumeric_only(b)
}
