//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{chunking, conversation, generation, prompt, rag};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    /// Staging mode
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Directory scanned for source documents
    #[serde(default = "default_data_folder")]
    pub data_folder: String,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub rag: RagConfig,

    /// Prompt assembly configuration
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Settings {
    /// Validate settings consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "chunking.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Validation(format!(
                "chunking.chunk_overlap ({}) must be strictly less than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::Validation(
                "rag.top_k must be at least 1".to_string(),
            ));
        }
        if self.rag.fallback_k == 0 {
            return Err(ConfigError::Validation(
                "rag.fallback_k must be at least 1".to_string(),
            ));
        }
        if self.prompt.excerpt_max_chars == 0 {
            return Err(ConfigError::Validation(
                "prompt.excerpt_max_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Character overlap between consecutive chunks (must be < chunk_size)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Final number of fragments returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates fetched before reranking; None disables expansion
    #[serde(default = "default_rerank_top_k")]
    pub rerank_top_k: Option<usize>,

    /// Reduced k for the degradation path
    #[serde(default = "default_fallback_k")]
    pub fallback_k: usize,

    /// Enable the cross-encoder reranking stage
    #[serde(default = "default_true")]
    pub reranking_enabled: bool,

    /// Embedding dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            rerank_top_k: default_rerank_top_k(),
            fallback_k: default_fallback_k(),
            reranking_enabled: true,
            embedding_dim: default_embedding_dim(),
        }
    }
}

/// Prompt assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Organization the assistant answers for
    #[serde(default = "default_organization")]
    pub organization: String,

    /// Character budget per fragment excerpt
    #[serde(default = "default_excerpt_max_chars")]
    pub excerpt_max_chars: usize,

    /// Metadata keys tried, in order, when resolving a citation label
    #[serde(default = "default_source_id_keys")]
    pub source_id_keys: Vec<String>,

    /// Rolling chat history bound (turns)
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            excerpt_max_chars: default_excerpt_max_chars(),
            source_id_keys: default_source_id_keys(),
            max_history_turns: default_max_history_turns(),
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum new tokens per response
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus-sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_data_folder() -> String {
    "data".to_string()
}

fn default_chunk_size() -> usize {
    chunking::CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    chunking::CHUNK_OVERLAP
}

fn default_top_k() -> usize {
    rag::DEFAULT_TOP_K
}

fn default_rerank_top_k() -> Option<usize> {
    Some(rag::DEFAULT_RERANK_TOP_K)
}

fn default_fallback_k() -> usize {
    rag::DEFAULT_FALLBACK_K
}

fn default_embedding_dim() -> usize {
    rag::EMBEDDING_DIM
}

fn default_organization() -> String {
    prompt::ORGANIZATION.to_string()
}

fn default_excerpt_max_chars() -> usize {
    prompt::EXCERPT_MAX_CHARS
}

fn default_source_id_keys() -> Vec<String> {
    prompt::SOURCE_ID_KEYS.iter().map(|k| k.to_string()).collect()
}

fn default_max_history_turns() -> usize {
    conversation::MAX_HISTORY_TURNS
}

fn default_max_new_tokens() -> usize {
    generation::MAX_NEW_TOKENS
}

fn default_temperature() -> f32 {
    generation::TEMPERATURE
}

fn default_top_p() -> f32 {
    generation::TOP_P
}

/// Load settings from config files and environment variables
///
/// Sources, later ones overriding earlier:
/// 1. `config/default` (any supported format, optional)
/// 2. `config/{env}` when an environment name is given (optional)
/// 3. `PUBS_ASSISTANT__` prefixed environment variables
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("PUBS_ASSISTANT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
