//! Text normalization
//!
//! Contraction expansion and page-break reconciliation over sentinel-delimited
//! document text, plus the line unwrapping applied before decomposition.

pub mod contractions;

use regex_lite::{Captures, Regex};
use std::sync::LazyLock;

/// Separator placed between pages of a document
pub const PAGE_SEPARATOR: &str = "\n-----\n";

const PAGE_SENTINEL: &str = "-----";

static CONTRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut keys: Vec<&str> = contractions::CONTRACTIONS.iter().map(|(k, _)| *k).collect();
    // Leftmost-first alternation: longer keys must come first
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let (leading, words): (Vec<&str>, Vec<&str>) = keys.into_iter().partition(|k| k.starts_with('\''));
    let alternation = |keys: &[&str]| {
        keys.iter()
            .map(|k| regex_lite::escape(k))
            .collect::<Vec<_>>()
            .join("|")
    };
    // `\b` cannot sit before an apostrophe, so those keys capture the
    // preceding non-word character instead
    Regex::new(&format!(
        r"(^|[^0-9A-Za-z_'])({})\b|\b({})\b",
        alternation(&leading),
        alternation(&words)
    ))
    .expect("contraction pattern is valid")
});

static FOOTNOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[A-Z]").expect("footnote pattern is valid"));

static WRAPPED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)\n").expect("line pattern is valid"));

/// Expand contractions and reconcile page breaks.
///
/// Footnote lines at the bottom of a page are removed, blank pages dropped,
/// and a page that ends mid-sentence is joined to a following page that
/// starts in lowercase.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let text = expand_contractions(&fold_apostrophes(raw));

    let pages: Vec<String> = split_pages(&text)
        .into_iter()
        .map(|page| strip_footnote(&page))
        .filter(|page| !page.trim().is_empty())
        .collect();

    merge_continued_pages(pages).join(PAGE_SEPARATOR)
}

/// Replace every known contraction with its expansion
pub fn expand_contractions(text: &str) -> String {
    CONTRACTION_RE
        .replace_all(text, |caps: &Captures| {
            let (lead, key) = match (caps.get(2), caps.get(3)) {
                (Some(key), _) => (caps.get(1).map_or("", |m| m.as_str()), key.as_str()),
                (None, Some(key)) => ("", key.as_str()),
                (None, None) => return caps[0].to_string(),
            };
            format!("{}{}", lead, contractions::expansion(key).unwrap_or(key))
        })
        .into_owned()
}

/// Turn a newline that directly follows a word character into a space,
/// page by page, leaving the page sentinels in place.
pub fn unwrap_lines(text: &str) -> String {
    split_pages(text)
        .iter()
        .map(|page| WRAPPED_LINE_RE.replace_all(page, "$1 ").into_owned())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// Replace page sentinels with blank lines
pub fn strip_page_separators(text: &str) -> String {
    split_pages(text).join("\n\n")
}

/// Split text on sentinel lines
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim() == PAGE_SENTINEL {
            pages.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    pages.push(current.join("\n"));

    pages
}

fn fold_apostrophes(text: &str) -> String {
    text.replace(['\u{2018}', '\u{2019}'], "'")
}

/// Drop trailing footnote lines until the last non-empty line is body text
fn strip_footnote(page: &str) -> String {
    let mut lines: Vec<&str> = page.split('\n').collect();
    while let Some(last) = lines.iter().rposition(|l| !l.trim().is_empty()) {
        if !FOOTNOTE_RE.is_match(lines[last]) {
            break;
        }
        lines.truncate(last);
    }
    lines.join("\n")
}

fn ends_sentence(page: &str) -> bool {
    matches!(page.trim_end().chars().last(), Some('.' | '!' | '?'))
}

fn starts_lowercase(page: &str) -> bool {
    page.trim_start()
        .chars()
        .next()
        .is_some_and(char::is_lowercase)
}

fn merge_continued_pages(pages: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(pages.len());

    for page in pages {
        if let Some(prev) = merged.last_mut() {
            if !ends_sentence(prev) && starts_lowercase(&page) {
                *prev = format!("{} {}", prev.trim_end(), page.trim_start());
                continue;
            }
        }
        merged.push(page);
    }

    merged
}
