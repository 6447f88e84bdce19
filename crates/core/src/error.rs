//! Top-level error type
//!
//! Crate-specific errors (`RagError`, `LlmError`, `ConfigError`) convert
//! into this type at the service boundary.

use thiserror::Error;

/// Top-level assistant error
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Retrieval error: {0}")]
    Rag(String),

    #[error("Generation error: {0}")]
    Llm(String),

    #[error("Ingestion error: {0}")]
    Ingest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for the top-level error
pub type Result<T> = std::result::Result<T, Error>;
