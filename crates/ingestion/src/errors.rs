//! Ingestion error types

use factrag_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("No dependency parser model available (tried: {})", tried.join(", "))]
    ParserUnavailable { tried: Vec<String> },

    #[error("Dependency parse failed: {0}")]
    ParseError(String),

    #[error("Reformatted text diverged from the source after {attempts} attempts")]
    ReformatMismatch { attempts: u32 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Upstream(#[from] AppError),
}

impl IngestionError {
    /// True when an external service stayed unreachable after retries
    pub fn is_service_unavailable(&self) -> bool {
        match self {
            IngestionError::ParserUnavailable { .. } => true,
            IngestionError::Upstream(e) => e.is_service_unavailable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_unavailable_lists_models() {
        let err = IngestionError::ParserUnavailable {
            tried: vec!["en_core_web_lg".into(), "en_core_web_sm".into()],
        };
        assert_eq!(
            err.to_string(),
            "No dependency parser model available (tried: en_core_web_lg, en_core_web_sm)"
        );
        assert!(err.is_service_unavailable());
    }

    #[test]
    fn test_upstream_unavailable_passes_through() {
        let err: IngestionError = AppError::ServiceUnavailable {
            service: "embedding".into(),
            attempts: 3,
            message: "503".into(),
        }
        .into();
        assert!(err.is_service_unavailable());
        assert!(!IngestionError::FileNotFound("a.pdf".into()).is_service_unavailable());
    }
}
