//! Metrics and observability utilities
//!
//! Metrics go through the `metrics` facade; without an installed recorder
//! every call is a no-op, so library code records unconditionally.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

/// Metrics prefix for all FactRAG metrics
pub const METRICS_PREFIX: &str = "factrag";

/// Register all metric descriptions
pub fn register_metrics() {
    // Ingestion metrics
    describe_counter!(
        format!("{}_facts_extracted_total", METRICS_PREFIX),
        Unit::Count,
        "Total atomic facts extracted before the corpus cap"
    );

    describe_gauge!(
        format!("{}_corpus_facts", METRICS_PREFIX),
        Unit::Count,
        "Facts in the current corpus"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Document ingestion latency in seconds"
    );

    describe_counter!(
        format!("{}_reformat_mismatches_total", METRICS_PREFIX),
        Unit::Count,
        "Reformatted pages rejected by the alphanumeric check"
    );

    // Embedding metrics
    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );

    describe_histogram!(
        format!("{}_embedding_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Embedding generation latency in seconds"
    );

    // Generation metrics
    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total generation API requests"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Generation latency in seconds"
    );

    // Retrieval metrics
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total questions answered"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retrieval latency in seconds"
    );

    describe_counter!(
        format!("{}_ungrounded_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Questions where no fact cleared the threshold"
    );

    // Resilience
    describe_counter!(
        format!("{}_external_retries_total", METRICS_PREFIX),
        Unit::Count,
        "Retries issued against external services"
    );

    tracing::debug!("Metrics registered");
}

/// Helper to record embedding metrics
pub fn record_embedding(duration_secs: f64, model: &str, mode: &str, batch_size: usize, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "mode" => mode.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_embedding_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
        tracing::trace!(batch_size, "Embedding batch recorded");
    }
}

/// Helper to record generation metrics
pub fn record_generation(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_generation_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    }
}

/// Helper to record retrieval metrics
pub fn record_retrieval(duration_secs: f64, candidates: usize, returned: usize) {
    counter!(format!("{}_queries_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_retrieval_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    if returned == 0 {
        counter!(format!("{}_ungrounded_queries_total", METRICS_PREFIX)).increment(1);
    }
    tracing::trace!(candidates, returned, "Retrieval recorded");
}

/// Helper to record ingestion metrics
pub fn record_ingestion(duration_secs: f64, facts_extracted: usize, facts_kept: usize) {
    counter!(format!("{}_facts_extracted_total", METRICS_PREFIX))
        .increment(facts_extracted as u64);

    gauge!(format!("{}_corpus_facts", METRICS_PREFIX)).set(facts_kept as f64);

    histogram!(format!("{}_ingestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record a rejected reformatting attempt
pub fn record_reformat_mismatch() {
    counter!(format!("{}_reformat_mismatches_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record a retry against an external service
pub fn record_retry(service: &str) {
    counter!(
        format!("{}_external_retries_total", METRICS_PREFIX),
        "service" => service.to_string()
    )
    .increment(1);
}
