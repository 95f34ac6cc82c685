//! PDF text extraction module
//!
//! Extracts per-page text with lopdf and joins the pages with the page
//! sentinel so later stages can reason about page boundaries.

use crate::errors::IngestionError;
use crate::normalizer::PAGE_SEPARATOR;
use std::path::Path;
use tracing::{debug, warn};

/// Extract text content from a PDF file, one sentinel-delimited block per page
pub fn extract_text_from_pdf(path: &Path) -> Result<String, IngestionError> {
    if !path.exists() {
        return Err(IngestionError::FileNotFound(path.display().to_string()));
    }

    let doc = lopdf::Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let page_texts = collect_pages(
        path,
        pages
            .keys()
            .map(|&page_num| (page_num, doc.extract_text(&[page_num]))),
    )?;

    let text = join_pages(&page_texts);
    if text.trim().is_empty() {
        return Err(IngestionError::PdfParseError {
            path: path.display().to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    debug!(chars = text.len(), "Text extraction complete");
    Ok(text)
}

/// Gather page texts in page order; one unreadable page fails the document
fn collect_pages<E: std::fmt::Display>(
    path: &Path,
    pages: impl Iterator<Item = (u32, Result<String, E>)>,
) -> Result<Vec<String>, IngestionError> {
    pages
        .map(|(page_num, text)| {
            text.map_err(|e| {
                warn!(page = page_num, error = %e, "Failed to extract text from page");
                IngestionError::PdfParseError {
                    path: path.display().to_string(),
                    message: format!("Failed to extract text from page {}: {}", page_num, e),
                }
            })
        })
        .collect()
}

/// Join page texts with the page sentinel, dropping the trailing newline
/// lopdf leaves on each page.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.strip_suffix('\n').unwrap_or(p))
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}
