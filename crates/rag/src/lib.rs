//! Retrieval for the publications assistant
//!
//! Features:
//! - Layered-separator chunking with content-addressed fragment ids
//! - Publication metadata extraction (topics, dates, entities)
//! - Dense vector search behind a pluggable `VectorIndex` capability
//! - Optional cross-encoder reranking with lazy one-time initialization
//! - Safe retrieval with a single reduced-k fallback
//! - Plain-text document loading and indexing

pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod metadata;
pub mod reranker;
pub mod retriever;
pub mod vector_store;

pub use chunker::{ChunkConfig, Chunker, LayeredChunker, MetadataChunker, WordChunker};
pub use embeddings::{Embedder, EmbeddingConfig, HashEmbedder};
pub use loader::{index_documents, DocumentLoader};
pub use metadata::MetadataExtractor;
pub use reranker::{LexicalScorer, RerankScorer, RerankerHandle};
pub use retriever::{RetrievalEngine, RetrieverConfig};
pub use vector_store::{InMemoryIndex, SearchFilter, VectorDistance, VectorIndex};

use thiserror::Error;

/// Retrieval errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Reranker error: {0}")]
    Reranker(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Retrieval failed for query {query:?} (k={top_k}): {source}")]
    Retrieval {
        query: String,
        top_k: usize,
        #[source]
        source: Box<RagError>,
    },

    #[error(
        "Primary and fallback retrieval both failed for query {query:?}: \
         primary (k={top_k}): {primary}; fallback (k={fallback_k}): {fallback}"
    )]
    RetrievalExhausted {
        query: String,
        top_k: usize,
        fallback_k: usize,
        primary: Box<RagError>,
        fallback: Box<RagError>,
    },
}

impl From<RagError> for pubs_assistant_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Config(msg) => pubs_assistant_core::Error::Config(msg),
            RagError::Ingest(msg) => pubs_assistant_core::Error::Ingest(msg),
            other => pubs_assistant_core::Error::Rag(other.to_string()),
        }
    }
}
