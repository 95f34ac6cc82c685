//! Command-line arguments

use clap::{Parser, Subcommand};
use factrag_common::AppConfig;
use std::path::PathBuf;

/// FactRAG - answer questions about a PDF from its atomic facts
#[derive(Parser, Debug)]
#[command(name = "factrag", version, about, long_about = None)]
pub struct Args {
    /// Configuration file (TOML); defaults to config/ lookup plus APP__ variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Minimum cosine similarity for a fact to be used
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub threshold: Option<f32>,

    /// Number of facts handed to the answer model
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Maximum facts kept from the document
    #[arg(long, global = true)]
    pub max_facts: Option<usize>,

    /// Skip the generative reformatting pass
    #[arg(long, global = true)]
    pub no_reformat: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract and print the fact corpus of a PDF
    Facts {
        /// PDF document
        #[arg(value_name = "PDF")]
        pdf: PathBuf,

        /// Print the corpus as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer questions about a PDF
    Ask {
        /// PDF document
        #[arg(value_name = "PDF")]
        pdf: PathBuf,

        /// Question to answer; reads questions from stdin when omitted
        #[arg(short, long)]
        question: Option<String>,

        /// Print the similarity of every fact
        #[arg(long)]
        show_scores: bool,
    },
}

impl Args {
    /// Apply flag overrides on top of loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(threshold) = self.threshold {
            config.retrieval.threshold = threshold;
        }
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if let Some(max_facts) = self.max_facts {
            config.ingestion.max_facts = max_facts;
        }
        if self.no_reformat {
            config.ingestion.reformat.enabled = false;
        }
    }
}
