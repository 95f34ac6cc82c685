//! FactRAG context
//!
//! Assembles retrieved facts into a grounded prompt and asks the generator
//! for an answer, falling back to a fixed reply when nothing was retrieved.

pub mod composer;
pub mod prompt;

pub use composer::{compose, AnswerComposer};
pub use prompt::build_prompt;
