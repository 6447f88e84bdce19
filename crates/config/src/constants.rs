//! Centralized constants for the publications assistant
//!
//! Single source of truth for retrieval, chunking, and generation
//! defaults. Settings fall back to these values, and components that are
//! constructed without settings use them directly.

/// Chunking defaults
pub mod chunking {
    /// Target chunk length in characters
    pub const CHUNK_SIZE: usize = 500;

    /// Character overlap carried between consecutive chunks
    pub const CHUNK_OVERLAP: usize = 100;

    /// Number of leading characters hashed into the fragment id
    pub const ID_PREFIX_CHARS: usize = 50;

    /// Fragment id length in hex characters (~64 bits of the SHA-256)
    pub const ID_HEX_LEN: usize = 16;
}

/// Retrieval defaults
pub mod rag {
    /// Final number of fragments returned to the caller
    pub const DEFAULT_TOP_K: usize = 5;

    /// Candidates fetched before reranking narrows them to top-k
    pub const DEFAULT_RERANK_TOP_K: usize = 10;

    /// Reduced k used by the degradation path
    pub const DEFAULT_FALLBACK_K: usize = 3;

    /// Hard ceiling on caller-requested top-k
    pub const MAX_TOP_K: usize = 20;

    /// Embedding dimension of the reference embedder
    pub const EMBEDDING_DIM: usize = 384;
}

/// Prompt assembly defaults
pub mod prompt {
    /// Character budget per fragment excerpt in the context block
    pub const EXCERPT_MAX_CHARS: usize = 800;

    /// Metadata keys tried, in order, when resolving a citation label
    pub const SOURCE_ID_KEYS: &[&str] = &["publication_id", "doc_id"];

    /// Organization the assistant answers for
    pub const ORGANIZATION: &str = "Deutsche Telekom";

    /// Rendered in place of the context block when retrieval is empty
    pub const EMPTY_CONTEXT_MARKER: &str = "No relevant documents found.";
}

/// Generation defaults
pub mod generation {
    /// Maximum new tokens per response
    pub const MAX_NEW_TOKENS: usize = 768;

    /// Sampling temperature
    pub const TEMPERATURE: f32 = 0.6;

    /// Nucleus-sampling cutoff
    pub const TOP_P: f32 = 0.95;
}

/// Metadata extraction limits
pub mod metadata {
    /// Maximum mentioned entities attached per document
    pub const ENTITY_LIMIT: usize = 10;
}

/// Conversation defaults
pub mod conversation {
    /// Rolling chat history bound (turns)
    pub const MAX_HISTORY_TURNS: usize = 10;
}
