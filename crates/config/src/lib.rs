//! Configuration management for the publications assistant
//!
//! Supports loading configuration from:
//! - TOML/YAML files (config/default plus an environment overlay)
//! - Environment variables (PUBS_ASSISTANT__ prefix)
//!
//! All tunables have defaults, so a missing config file is not an error;
//! validation failures are.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, ChunkingConfig, GenerationConfig, PromptConfig, RagConfig,
    RuntimeEnvironment, Settings,
};

use thiserror::Error;

/// Configuration errors, fatal at startup and never retried
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}
