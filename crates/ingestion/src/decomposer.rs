//! Atomic fact decomposition
//!
//! Each subject attached to a verb yields one fact per object of that verb
//! and one per object of its prepositions:
//!
//! - `<subject> <verb phrase> <object>.`
//! - `<subject> <verb phrase> <preposition> <object>.`
//!
//! Facts keep sentence order; within a sentence direct objects come before
//! prepositional ones.

use crate::errors::Result;
use crate::parser::{Dep, DependencyParser, ParsedSentence, Pos};
use tracing::{debug, instrument};

/// Decompose `text` into atomic fact sentences.
///
/// The whole text is parsed once for sentence boundaries, then each sentence
/// is parsed again on its own.
#[instrument(skip_all, fields(chars = text.len(), model = parser.model_name()))]
pub async fn decompose(text: &str, parser: &dyn DependencyParser) -> Result<Vec<String>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let sentences = parser.parse(text).await?;
    let mut facts = Vec::new();

    for sentence in &sentences {
        let isolated = sentence.text.trim();
        if isolated.is_empty() {
            continue;
        }
        for parsed in parser.parse(isolated).await? {
            facts.extend(facts_from_sentence(&parsed));
        }
    }

    debug!(sentences = sentences.len(), facts = facts.len(), "Decomposition complete");
    Ok(facts)
}

/// Facts for a single parsed sentence
pub fn facts_from_sentence(sentence: &ParsedSentence) -> Vec<String> {
    let mut facts = Vec::new();

    for (index, token) in sentence.tokens().iter().enumerate() {
        if !matches!(token.dep, Dep::Nsubj | Dep::NsubjPass) || token.head == index {
            continue;
        }
        let verb = token.head;
        if !matches!(sentence.token(verb).pos, Pos::Verb | Pos::Aux) {
            continue;
        }

        let subject = span_text(sentence, index);
        if subject.is_empty() {
            continue;
        }
        let predicate = verb_phrase(sentence, verb);

        for &child in sentence.children(verb) {
            if matches!(
                sentence.token(child).dep,
                Dep::Dobj | Dep::Pobj | Dep::Attr | Dep::Iobj
            ) {
                let object = span_text(sentence, child);
                if !object.is_empty() {
                    facts.push(clean_fact(&format!("{subject} {predicate} {object}")));
                }
            }
        }

        for &prep in sentence.children(verb) {
            let prep_token = sentence.token(prep);
            if prep_token.dep != Dep::Prep || prep_token.pos != Pos::Adp {
                continue;
            }
            for &child in sentence.children(prep) {
                if sentence.token(child).dep != Dep::Pobj {
                    continue;
                }
                let object = span_text(sentence, child);
                if !object.is_empty() {
                    facts.push(clean_fact(&format!(
                        "{subject} {predicate} {} {object}",
                        prep_token.text
                    )));
                }
            }
        }
    }

    facts
}

/// Subtree text of `root`, dropping `prep` and `punct` branches that hang
/// below the root rather than on it.
fn span_text(sentence: &ParsedSentence, root: usize) -> String {
    let mut members = sentence.subtree_with(root, |parent, child| {
        parent == root || !matches!(sentence.token(child).dep, Dep::Prep | Dep::Punct)
    });
    members.sort_by_key(|&i| sentence.token(i).offset);
    join_tokens(sentence, &members)
}

/// Verb plus its auxiliaries, negation and particles
fn verb_phrase(sentence: &ParsedSentence, verb: usize) -> String {
    let mut members: Vec<usize> = std::iter::once(verb)
        .chain(sentence.children(verb).iter().copied().filter(|&c| {
            matches!(
                sentence.token(c).dep,
                Dep::Aux | Dep::AuxPass | Dep::Neg | Dep::Prt
            )
        }))
        .collect();
    members.sort_by_key(|&i| sentence.token(i).offset);
    join_tokens(sentence, &members)
}

fn join_tokens(sentence: &ParsedSentence, members: &[usize]) -> String {
    members
        .iter()
        .map(|&i| sentence.token(i).text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace, capitalize, and terminate with a period.
pub fn clean_fact(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = collapsed.chars();
    let mut fact = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };

    if !fact.ends_with(['.', '!', '?']) {
        fact.push('.');
    }
    fact
}
