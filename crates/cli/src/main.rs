//! FactRAG CLI
//!
//! `factrag facts <PDF>` prints the atomic facts of a document;
//! `factrag ask <PDF>` answers questions grounded in them.

mod app;
mod args;
mod commands;

use anyhow::Context;
use args::{Args, Commands};
use clap::Parser;
use factrag_common::{errors::AppError, metrics, AppConfig, VERSION};
use factrag_ingestion::IngestionError;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };

    init_tracing(&config);
    metrics::register_metrics();
    debug!("Starting FactRAG v{}", VERSION);

    match run(args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Command failed");
            match service_unavailable(&e) {
                Some(message) => {
                    eprintln!("Service unavailable: {message}");
                    ExitCode::from(2)
                }
                None => {
                    eprintln!("Error: {e:#}");
                    ExitCode::from(1)
                }
            }
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(&path.to_string_lossy())
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::load()?,
    };
    args.apply_overrides(&mut config);
    validator::Validate::validate(&config).map_err(AppError::from)?;
    Ok(config)
}

/// Logs go to stderr; stdout carries facts and answers only
fn init_tracing(config: &AppConfig) {
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
}

async fn run(args: Args, config: &AppConfig) -> anyhow::Result<()> {
    let app = app::App::build(config).await?;

    match args.command {
        Commands::Facts { pdf, json } => commands::facts(&app, &pdf, json).await,
        Commands::Ask {
            pdf,
            question,
            show_scores,
        } => commands::ask(&app, &pdf, question.as_deref(), show_scores).await,
    }
}

/// Message for failures caused by an unreachable external service
fn service_unavailable(err: &anyhow::Error) -> Option<String> {
    fn from_app(e: &AppError) -> Option<String> {
        match e {
            AppError::ServiceUnavailable {
                service,
                attempts,
                message,
            } => Some(format!("{service} failed after {attempts} attempts: {message}")),
            _ => None,
        }
    }

    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<AppError>() {
            return from_app(e);
        }
        match cause.downcast_ref::<IngestionError>()? {
            e @ IngestionError::ParserUnavailable { .. } => Some(e.to_string()),
            IngestionError::Upstream(e) => from_app(e),
            _ => None,
        }
    })
}
