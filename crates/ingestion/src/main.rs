//! FactRAG ingestion binary
//!
//! Usage: `ingest <PDF>`
//!
//! 1. Extracts and normalizes the document text
//! 2. Decomposes it into atomic facts
//! 3. Writes the corpus to stdout as JSON lines, one fact per line

use factrag_common::{config::AppConfig, metrics, VERSION};
use factrag_ingestion::{select_parser, IngestionProcessor};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    // Initialize tracing on stderr; stdout carries the facts
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    metrics::register_metrics();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: ingest <PDF>"))?;

    info!("Starting FactRAG ingestion v{}", VERSION);

    let parser = select_parser(&config.parser).await?;
    let processor = IngestionProcessor::from_config(&config, Arc::clone(&parser))?;
    let corpus = processor.process_pdf(&path).await?;

    let mut out = std::io::stdout().lock();
    for fact in corpus.facts() {
        serde_json::to_writer(&mut out, fact)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(run_id = %corpus.run_id, facts = corpus.len(), "Corpus written");
    Ok(())
}
