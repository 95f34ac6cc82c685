//! FactRAG ingestion
//!
//! Turns a PDF into a capped corpus of atomic fact sentences:
//! extraction, normalization, optional reformatting, then
//! dependency-parse-driven decomposition.

pub mod decomposer;
pub mod errors;
pub mod normalizer;
pub mod parser;
pub mod pdf;
pub mod processor;
pub mod reformat;

pub use decomposer::decompose;
pub use errors::{IngestionError, Result};
pub use normalizer::normalize;
pub use parser::{select_parser, DependencyParser};
pub use processor::IngestionProcessor;
