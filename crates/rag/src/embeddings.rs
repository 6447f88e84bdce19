//! Text embeddings
//!
//! The embedding model is an opaque capability behind the `Embedder`
//! trait. `HashEmbedder` is the shipped reference implementation: a
//! hashed bag-of-words projection that is deterministic and requires no
//! model files, suitable for development and tests.

use pubs_assistant_config::constants::rag;

/// Embedding configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Embedding dimension
    pub embedding_dim: usize,
    /// L2-normalize embeddings
    pub normalize: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            embedding_dim: rag::EMBEDDING_DIM,
            normalize: true,
        }
    }
}

/// Opaque text-to-vector capability
pub trait Embedder: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Embed multiple texts
    fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embedding dimension
    fn dim(&self) -> usize;
}

/// Hashed bag-of-words embedder
///
/// Each lowercased alphanumeric token is hashed (FNV-1a) into a bucket;
/// the resulting term-frequency vector is L2-normalized, so cosine
/// similarity reflects token overlap.
pub struct HashEmbedder {
    config: EmbeddingConfig,
}

impl HashEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EmbeddingConfig::default())
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.config.embedding_dim];

        for token in tokenize(text) {
            let idx = (fnv1a(&token) as usize) % self.config.embedding_dim;
            embedding[idx] += 1.0;
        }

        if self.config.normalize {
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut embedding {
                    *v /= norm;
                }
            }
        }

        embedding
    }

    fn dim(&self) -> usize {
        self.config.embedding_dim
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// FNV-1a, stable across platforms and runs
fn fnv1a(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for byte in text.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_normalized() {
        let embedder = HashEmbedder::default();
        let embedding = embedder.embed("5G coverage expands across Germany");

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let embedder = HashEmbedder::default();
        assert_eq!(
            embedder.embed("network security"),
            embedder.embed("network security")
        );
    }

    #[test]
    fn test_token_overlap_raises_similarity() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("5G network");
        let relevant = embedder.embed("the 5G network rollout continues");
        let unrelated = embedder.embed("sustainability targets for carbon reduction");

        let sim_relevant: f32 = query.iter().zip(&relevant).map(|(a, b)| a * b).sum();
        let sim_unrelated: f32 = query.iter().zip(&unrelated).map(|(a, b)| a * b).sum();

        assert!(sim_relevant > sim_unrelated);
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::default();
        let embedding = embedder.embed("");
        assert!(embedding.iter().all(|v| *v == 0.0));
    }
}
