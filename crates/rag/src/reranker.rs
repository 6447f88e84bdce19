//! Cross-encoder reranking
//!
//! The precise relevance model is an opaque capability behind
//! `RerankScorer`: one batched `(query, candidate)` scoring method,
//! higher score = more relevant, no fixed numeric range. `LexicalScorer`
//! is the shipped reference scorer; heavier cross-encoder models plug in
//! behind the same trait.
//!
//! `RerankerHandle` defers scorer construction to first use behind a
//! one-time barrier, so concurrent first use from multiple requests
//! initializes exactly once.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::RagError;

/// Pairwise relevance scoring capability
pub trait RerankScorer: Send + Sync {
    /// Score each candidate against the query; one score per candidate,
    /// in input order
    fn score_batch(&self, query: &str, candidates: &[&str]) -> Result<Vec<f32>, RagError>;

    /// Scorer name for logging
    fn name(&self) -> &str {
        "reranker"
    }
}

/// Keyword-overlap relevance scorer
pub struct LexicalScorer;

impl LexicalScorer {
    /// Common English stopwords
    const STOPWORDS: &'static [&'static str] = &[
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has",
        "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "must",
        "shall", "can", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into",
        "through", "during", "before", "after", "above", "below", "between", "under", "again",
        "then", "once", "here", "there", "when", "where", "why", "how", "all", "each", "few",
        "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same",
        "so", "than", "too", "very", "just", "and", "but", "if", "or", "because", "until",
        "while", "about", "i", "me", "my", "we", "our", "you", "your", "he", "him", "his",
        "she", "her", "it", "its", "they", "them", "their", "what", "which", "who", "whom",
        "this", "that", "these", "those",
    ];

    /// Score using TF-IDF-like weighting
    ///
    /// - Term frequency: sqrt(count in doc) for diminishing returns
    /// - IDF approximation: log(1 + word_length) favors specific terms
    /// - Position boost: earlier query terms weigh slightly more
    /// - Coverage bonus: documents matching more query terms win
    pub fn score(query: &str, document: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let doc_lower = document.to_lowercase();

        let stopwords: HashSet<&str> = Self::STOPWORDS.iter().copied().collect();

        let query_terms: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|w| w.len() > 1 && !stopwords.contains(*w))
            .collect();

        if query_terms.is_empty() {
            return 0.0;
        }

        let doc_words: Vec<&str> = doc_lower.split_whitespace().collect();
        let doc_len = doc_words.len().max(1) as f32;

        let mut total_score = 0.0f32;
        let mut matched_terms = 0usize;

        for (pos, term) in query_terms.iter().enumerate() {
            let tf = doc_words.iter().filter(|w| **w == *term).count() as f32;

            if tf > 0.0 {
                matched_terms += 1;

                let tf_score = tf.sqrt();
                let idf_approx = (1.0 + term.len() as f32).ln();
                let position_weight = 1.0 / (1.0 + pos as f32 * 0.1);
                let length_norm = 1.0 / (1.0 + (doc_len / 50.0).sqrt());

                total_score += tf_score * idf_approx * position_weight * length_norm;
            }
        }

        let coverage = matched_terms as f32 / query_terms.len() as f32;
        let coverage_bonus = coverage * 0.3;

        let raw_score = total_score + coverage_bonus;
        (raw_score / (raw_score + 1.0)).min(1.0)
    }
}

impl RerankScorer for LexicalScorer {
    fn score_batch(&self, query: &str, candidates: &[&str]) -> Result<Vec<f32>, RagError> {
        Ok(candidates
            .iter()
            .map(|doc| Self::score(query, doc))
            .collect())
    }

    fn name(&self) -> &str {
        "lexical"
    }
}

type ScorerFactory = Box<dyn Fn() -> Result<Arc<dyn RerankScorer>, RagError> + Send + Sync>;

/// Lazily initialized reranker
///
/// Construction runs at most once, on first use; a construction failure
/// is a configuration error and is surfaced unchanged on every
/// subsequent use.
pub struct RerankerHandle {
    factory: ScorerFactory,
    scorer: OnceCell<Arc<dyn RerankScorer>>,
}

impl RerankerHandle {
    /// Defer construction to the given factory
    pub fn new(factory: ScorerFactory) -> Self {
        Self {
            factory,
            scorer: OnceCell::new(),
        }
    }

    /// Wrap an already constructed scorer
    pub fn from_scorer(scorer: Arc<dyn RerankScorer>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(scorer);
        Self {
            factory: Box::new(|| {
                Err(RagError::Reranker(
                    "scorer was provided pre-built".to_string(),
                ))
            }),
            scorer: cell,
        }
    }

    /// Handle over the reference lexical scorer
    pub fn lexical() -> Self {
        Self::from_scorer(Arc::new(LexicalScorer))
    }

    /// Get the scorer, constructing it on first use
    pub fn get(&self) -> Result<&Arc<dyn RerankScorer>, RagError> {
        self.scorer.get_or_try_init(|| (self.factory)())
    }
}
