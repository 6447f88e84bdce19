//! Generation backend interface
//!
//! The text-generation runtime is an external collaborator: it receives
//! the assembled turn sequence and an opaque sampling parameter set, and
//! returns generated text with any role or special markers already
//! stripped. Rendering turns to the model's chat template is the
//! implementation's responsibility.

use pubs_assistant_config::constants::generation;
use pubs_assistant_config::GenerationConfig;

use crate::prompt::Message;
use crate::LlmError;

/// Sampling parameters for a generation call
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Maximum new tokens to generate
    pub max_new_tokens: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus-sampling cutoff
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: generation::MAX_NEW_TOKENS,
            temperature: generation::TEMPERATURE,
            top_p: generation::TOP_P,
        }
    }
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

/// Opaque prompt-to-text capability
///
/// Calls block until generation completes; callers needing timeouts wrap
/// the call at the transport layer.
pub trait TextGenerator: Send + Sync {
    /// Generate a response for the given turn sequence
    fn generate(&self, messages: &[Message], params: &GenerationParams)
        -> Result<String, LlmError>;

    /// Model name for logging
    fn model_name(&self) -> &str;

    /// Whether the model is ready to serve
    fn is_available(&self) -> bool {
        true
    }
}
