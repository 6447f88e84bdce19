//! Vector index capability
//!
//! The persistence engine is external to this core: the engine only needs
//! "store fragments, fetch k-nearest". `VectorIndex` captures that
//! capability; `InMemoryIndex` is the reference implementation used in
//! development and tests, with cosine scoring over the configured
//! embedder.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use pubs_assistant_core::Fragment;

use crate::embeddings::Embedder;
use crate::RagError;

/// Distance metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorDistance {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

/// Metadata filter with exact-match semantics
///
/// A fragment matches when every filter key is present in its metadata
/// with an equal value; list-valued metadata matches when any element
/// equals the filter value.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    fields: HashMap<String, serde_json::Value>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a metadata field to equal the given value
    pub fn field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check whether a fragment satisfies all filter fields
    pub fn matches(&self, fragment: &Fragment) -> bool {
        self.fields.iter().all(|(key, expected)| {
            match fragment.metadata.get(key) {
                Some(serde_json::Value::Array(items)) => items.iter().any(|v| v == expected),
                Some(value) => value == expected,
                None => false,
            }
        })
    }
}

/// Nearest-neighbor lookup over fragment embeddings
pub trait VectorIndex: Send + Sync {
    /// Embed and store fragments, upserting by fragment id
    fn add(&self, fragments: &[Fragment]) -> Result<(), RagError>;

    /// K-nearest fragments for a query, closest first; the filter
    /// restricts candidates at the index level
    fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Fragment>, RagError>;

    /// K-nearest fragments with their similarity scores, highest first
    fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Fragment, f32)>, RagError>;

    /// Number of stored fragments
    fn count(&self) -> Result<usize, RagError>;
}

struct Entry {
    fragment: Fragment,
    embedding: Vec<f32>,
}

/// In-memory vector index
pub struct InMemoryIndex {
    embedder: Arc<dyn Embedder>,
    distance: VectorDistance,
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryIndex {
    /// Create an index over the given embedder with cosine scoring
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_distance(embedder, VectorDistance::default())
    }

    /// Create an index with an explicit distance metric
    pub fn with_distance(embedder: Arc<dyn Embedder>, distance: VectorDistance) -> Self {
        Self {
            embedder,
            distance,
            entries: RwLock::new(Vec::new()),
        }
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.distance {
            VectorDistance::DotProduct => dot(a, b),
            VectorDistance::Cosine => {
                let denom = norm(a) * norm(b);
                if denom > 0.0 {
                    dot(a, b) / denom
                } else {
                    0.0
                }
            }
            // Negated so that higher is always better
            VectorDistance::Euclidean => {
                -a.iter()
                    .zip(b)
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt()
            }
        }
    }

    fn ranked(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<(Fragment, f32)>, RagError> {
        let query_embedding = self.embedder.embed(query);

        let entries = self.entries.read();
        let mut scored: Vec<(Fragment, f32)> = entries
            .iter()
            .filter(|e| filter.map_or(true, |f| f.matches(&e.fragment)))
            .map(|e| (e.fragment.clone(), self.score(&query_embedding, &e.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }
}

impl VectorIndex for InMemoryIndex {
    fn add(&self, fragments: &[Fragment]) -> Result<(), RagError> {
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts);

        let mut entries = self.entries.write();
        for (fragment, embedding) in fragments.iter().cloned().zip(embeddings) {
            match entries.iter_mut().find(|e| e.fragment.id == fragment.id) {
                Some(existing) => {
                    existing.fragment = fragment;
                    existing.embedding = embedding;
                }
                None => entries.push(Entry {
                    fragment,
                    embedding,
                }),
            }
        }

        Ok(())
    }

    fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Fragment>, RagError> {
        Ok(self
            .ranked(query, k, filter)?
            .into_iter()
            .map(|(fragment, _)| fragment)
            .collect())
    }

    fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Fragment, f32)>, RagError> {
        self.ranked(query, k, None)
    }

    fn count(&self) -> Result<usize, RagError> {
        Ok(self.entries.read().len())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;

    fn fragment(id: &str, text: &str, topic: Option<&str>) -> Fragment {
        let mut frag = Fragment::new(id, format!("doc_{}", id), 0, 1, text);
        if let Some(topic) = topic {
            frag = frag.with_metadata("topic", topic);
        }
        frag
    }

    fn index_with_samples() -> InMemoryIndex {
        let index = InMemoryIndex::new(Arc::new(HashEmbedder::default()));
        index
            .add(&[
                fragment(
                    "a",
                    "Deutsche Telekom offers 5G network services across Germany.",
                    Some("5G"),
                ),
                fragment(
                    "b",
                    "Telekom provides secure cloud solutions for enterprises.",
                    Some("Security"),
                ),
                fragment(
                    "c",
                    "Partnership with Microsoft enhances cloud capabilities.",
                    Some("Partnership"),
                ),
            ])
            .unwrap();
        index
    }

    #[test]
    fn test_add_and_count() {
        let index = index_with_samples();
        assert_eq!(index.count().unwrap(), 3);
    }

    #[test]
    fn test_add_upserts_by_id() {
        let index = index_with_samples();
        index
            .add(&[fragment("a", "Rewritten content for fragment a.", None)])
            .unwrap();

        assert_eq!(index.count().unwrap(), 3);
    }

    #[test]
    fn test_search_ranks_token_overlap_first() {
        let index = index_with_samples();
        let results = index.similarity_search("5G network", 1, None).unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("5G"));
    }

    #[test]
    fn test_filter_restricts_candidates() {
        let index = index_with_samples();
        let filter = SearchFilter::new().field("topic", "Security");

        let results = index
            .similarity_search("cloud solutions", 5, Some(&filter))
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata_str("topic"), Some("Security"));
    }

    #[test]
    fn test_filter_matches_list_values() {
        let mut frag = Fragment::new("t", "doc_t", 0, 1, "Topics list test content");
        frag
            .metadata
            .insert("topics".to_string(), serde_json::json!(["5G", "Security"]));

        let filter = SearchFilter::new().field("topics", "5G");
        assert!(filter.matches(&frag));

        let filter = SearchFilter::new().field("topics", "Partnership");
        assert!(!filter.matches(&frag));
    }

    #[test]
    fn test_scores_are_descending() {
        let index = index_with_samples();
        let results = index
            .similarity_search_with_score("secure cloud solutions", 3)
            .unwrap();

        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }
}
