//! Two-stage retrieval engine
//!
//! Stage 1 fetches candidates from the vector index ordered by
//! similarity; Stage 2 optionally rescores them with a cross-encoder and
//! keeps the top-k. A caller-facing safe variant degrades to a single
//! reduced-k retry on index failure.

use std::cmp::Ordering;
use std::sync::Arc;

use pubs_assistant_config::constants::rag;
use pubs_assistant_core::Fragment;

use crate::reranker::RerankerHandle;
use crate::vector_store::{SearchFilter, VectorIndex};
use crate::RagError;

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Final number of fragments returned to the caller
    pub top_k: usize,
    /// Candidates fetched before reranking; values <= top_k disable the
    /// rerank stage for the request
    pub rerank_top_k: Option<usize>,
    /// Reduced k used by the degradation path
    pub fallback_k: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: rag::DEFAULT_TOP_K,
            rerank_top_k: Some(rag::DEFAULT_RERANK_TOP_K),
            fallback_k: rag::DEFAULT_FALLBACK_K,
        }
    }
}

impl From<&pubs_assistant_config::RagConfig> for RetrieverConfig {
    fn from(config: &pubs_assistant_config::RagConfig) -> Self {
        Self {
            top_k: config.top_k,
            rerank_top_k: config.rerank_top_k,
            fallback_k: config.fallback_k,
        }
    }
}

/// Two-stage retrieval over a vector index
pub struct RetrievalEngine {
    index: Arc<dyn VectorIndex>,
    reranker: Option<RerankerHandle>,
    config: RetrieverConfig,
}

impl RetrievalEngine {
    /// Create an engine without a reranker
    pub fn new(index: Arc<dyn VectorIndex>, config: RetrieverConfig) -> Self {
        Self {
            index,
            reranker: None,
            config,
        }
    }

    /// Attach a reranker; selected once at construction
    pub fn with_reranker(mut self, reranker: RerankerHandle) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Retrieve the top-k most relevant fragments
    ///
    /// When a reranker is configured and `rerank_top_k > top_k`, Stage 1
    /// over-fetches `rerank_top_k` candidates and Stage 2 narrows them by
    /// cross-encoder score (stable sort: ties keep similarity order).
    /// `rerank_top_k <= top_k` means no expansion and the scorer is never
    /// invoked. The filter always applies to Stage 1 candidate
    /// generation.
    pub fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        rerank_top_k: Option<usize>,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Fragment>, RagError> {
        let fetch_k = match (&self.reranker, rerank_top_k) {
            (Some(_), Some(rk)) if rk > top_k => rk,
            _ => top_k,
        };

        let candidates = self
            .index
            .similarity_search(query, fetch_k, filter)
            .map_err(|e| RagError::Retrieval {
                query: query.to_string(),
                top_k,
                source: Box::new(e),
            })?;

        // Rescoring a set no larger than the final count is a no-op
        let mut results = match &self.reranker {
            Some(handle) if candidates.len() > top_k => {
                self.rerank(handle, query, candidates, top_k)?
            }
            _ => candidates,
        };

        results.truncate(top_k);
        Ok(results)
    }

    /// Retrieve with the engine's configured top-k / rerank-top-k
    pub fn retrieve_with_defaults(
        &self,
        query: &str,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Fragment>, RagError> {
        self.retrieve(query, self.config.top_k, self.config.rerank_top_k, filter)
    }

    fn rerank(
        &self,
        handle: &RerankerHandle,
        query: &str,
        candidates: Vec<Fragment>,
        top_k: usize,
    ) -> Result<Vec<Fragment>, RagError> {
        let scorer = handle.get()?;

        let texts: Vec<&str> = candidates.iter().map(|f| f.text.as_str()).collect();
        let scores = scorer
            .score_batch(query, &texts)
            .map_err(|e| RagError::Retrieval {
                query: query.to_string(),
                top_k,
                source: Box::new(e),
            })?;

        tracing::debug!(
            scorer = scorer.name(),
            candidates = candidates.len(),
            top_k,
            "Reranked candidate set"
        );

        let mut scored: Vec<(f32, Fragment)> =
            scores.into_iter().zip(candidates).collect();
        // Stable sort: equal scores keep their similarity order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored.into_iter().map(|(_, fragment)| fragment).collect())
    }

    /// Retrieve with a single reduced-k retry on index failure
    ///
    /// A genuine empty result returns silently; a backend failure on both
    /// attempts fails loudly with one error referencing both causes.
    pub fn retrieve_safe(
        &self,
        query: &str,
        top_k: usize,
        fallback_k: usize,
    ) -> Result<Vec<Fragment>, RagError> {
        match self.index.similarity_search(query, top_k, None) {
            Ok(results) => Ok(results),
            Err(primary) => {
                tracing::warn!(
                    error = %primary,
                    top_k,
                    fallback_k,
                    "Primary retrieval failed, retrying at reduced k"
                );

                match self.index.similarity_search(query, fallback_k, None) {
                    Ok(results) => {
                        tracing::info!(
                            results = results.len(),
                            fallback_k,
                            "Fallback retrieval succeeded"
                        );
                        Ok(results)
                    }
                    Err(fallback) => Err(RagError::RetrievalExhausted {
                        query: query.to_string(),
                        top_k,
                        fallback_k,
                        primary: Box::new(primary),
                        fallback: Box::new(fallback),
                    }),
                }
            }
        }
    }

    /// Retrieve fragments with their raw similarity scores, highest first
    pub fn retrieve_with_scores(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<(Fragment, f32)>, RagError> {
        self.index
            .similarity_search_with_score(query, top_k)
            .map_err(|e| RagError::Retrieval {
                query: query.to_string(),
                top_k,
                source: Box::new(e),
            })
    }
}
