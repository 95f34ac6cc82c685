//! FactRAG search
//!
//! Embeds the fact corpus once, then ranks facts against each question by
//! cosine similarity with a relevance threshold and a top-k cut.

pub mod retrieval;

pub use retrieval::{
    rank, retrieve, retrieve_scored, EmbeddedCorpus, Retrieval, RetrievalParams, Retriever,
    ScoredFact,
};
