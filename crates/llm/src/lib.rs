//! Prompt assembly and generation for the publications assistant
//!
//! Builds structured chat-style prompts from retrieved fragments and
//! conversation history, and defines the opaque `TextGenerator`
//! capability consumed by the answering service. Rendering the turn
//! sequence to a model-specific wire format (chat template) belongs to
//! the generator implementation, not to this crate.

pub mod backend;
pub mod prompt;

pub use backend::{GenerationParams, TextGenerator};
pub use prompt::{Message, PromptAssembler, Role};

use thiserror::Error;

/// Generation errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),
}

impl From<LlmError> for pubs_assistant_core::Error {
    fn from(err: LlmError) -> Self {
        pubs_assistant_core::Error::Llm(err.to_string())
    }
}
