//! Text chunking
//!
//! Splits documents into overlapping fragments for vector indexing.
//!
//! # Strategies
//!
//! 1. **Layered**: try paragraph breaks, then line breaks, then sentence
//!    ends, then spaces, then raw characters, aiming for a target
//!    character length with character overlap between consecutive chunks
//! 2. **Word-count**: fixed-size word windows with word overlap
//!
//! `MetadataChunker` wraps the layered strategy and stamps each fragment
//! with a stable content-addressed id plus inherited document metadata.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use pubs_assistant_config::constants::chunking;
use pubs_assistant_core::Fragment;

use crate::RagError;

/// Separator layers, coarsest first; the empty string splits into raw
/// characters and always matches.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target chunk length (characters for the layered chunker, words for
    /// the word chunker)
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, strictly less than chunk_size
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: chunking::CHUNK_SIZE,
            chunk_overlap: chunking::CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be strictly less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Shared contract: split text into ordered, non-empty chunks
pub trait Chunker: Send + Sync {
    /// Split text into chunks. Never returns empty chunks; when nothing
    /// survives splitting, the original text is returned whole.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Layered-separator chunker targeting a character length
pub struct LayeredChunker {
    config: ChunkConfig,
}

impl LayeredChunker {
    /// Create a layered chunker; invalid size/overlap is a configuration
    /// error
    pub fn new(config: ChunkConfig) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split with the given separator layers
    fn split_text(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator that occurs in the text; "" always matches
        let mut sep_idx = separators.len().saturating_sub(1);
        for (i, s) in separators.iter().enumerate() {
            if s.is_empty() || text.contains(s) {
                sep_idx = i;
                break;
            }
        }
        let sep = separators[sep_idx];
        let rest = &separators[sep_idx + 1..];

        let splits: Vec<String> = if sep.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(sep).map(str::to_string).collect()
        };

        let mut chunks = Vec::new();
        let mut good: Vec<String> = Vec::new();

        for split in splits {
            if char_len(&split) < self.config.chunk_size {
                good.push(split);
            } else {
                if !good.is_empty() {
                    chunks.extend(self.merge_splits(std::mem::take(&mut good), sep));
                }
                if rest.is_empty() {
                    // Cannot split further; emit oversized as-is
                    chunks.push(split);
                } else {
                    chunks.extend(self.split_text(&split, rest));
                }
            }
        }

        if !good.is_empty() {
            chunks.extend(self.merge_splits(good, sep));
        }

        chunks
    }

    /// Greedily merge splits into chunks near chunk_size, carrying
    /// chunk_overlap characters into the next chunk
    fn merge_splits(&self, splits: Vec<String>, sep: &str) -> Vec<String> {
        let sep_len = char_len(sep);

        let mut chunks = Vec::new();
        let mut current: VecDeque<String> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let split_len = char_len(&split);
            let join_cost = if current.is_empty() { 0 } else { sep_len };

            if total + split_len + join_cost > self.config.chunk_size && !current.is_empty() {
                let joined = join(&current, sep);
                if !joined.trim().is_empty() {
                    chunks.push(joined.trim().to_string());
                }

                // Drop from the front until within the overlap budget
                while total > self.config.chunk_overlap
                    || (total + split_len + if current.is_empty() { 0 } else { sep_len }
                        > self.config.chunk_size
                        && total > 0)
                {
                    let front = match current.pop_front() {
                        Some(f) => f,
                        None => break,
                    };
                    total -= char_len(&front) + if current.is_empty() { 0 } else { sep_len };
                }
            }

            let join_cost = if current.is_empty() { 0 } else { sep_len };
            total += split_len + join_cost;
            current.push_back(split);
        }

        let joined = join(&current, sep);
        if !joined.trim().is_empty() {
            chunks.push(joined.trim().to_string());
        }

        chunks
    }
}

impl Chunker for LayeredChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let chunks: Vec<String> = self
            .split_text(text, SEPARATORS)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if chunks.is_empty() {
            vec![text.to_string()]
        } else {
            chunks
        }
    }
}

/// Fixed-size word-count chunker with word overlap
pub struct WordChunker {
    config: ChunkConfig,
}

impl WordChunker {
    /// Create a word chunker; invalid size/overlap is a configuration
    /// error
    pub fn new(config: ChunkConfig) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Chunker for WordChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let step = self.config.chunk_size - self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut i = 0;
        while i < words.len() {
            let end = (i + self.config.chunk_size).min(words.len());
            let chunk = words[i..end].join(" ");
            if !chunk.is_empty() {
                chunks.push(chunk);
            }
            i += step;
        }

        if chunks.is_empty() {
            vec![text.to_string()]
        } else {
            chunks
        }
    }
}

/// Metadata-aware chunker producing addressable fragments
pub struct MetadataChunker {
    splitter: LayeredChunker,
}

impl MetadataChunker {
    /// Create a metadata chunker over the layered splitter
    pub fn new(config: ChunkConfig) -> Result<Self, RagError> {
        Ok(Self {
            splitter: LayeredChunker::new(config)?,
        })
    }

    /// Stable fragment id: SHA-256 of "{doc_id}_{index}_{first 50 chars}",
    /// truncated to 16 hex characters. Identical inputs always reproduce
    /// the same id; different content at the same position does not.
    fn fragment_id(document_id: &str, index: usize, text: &str) -> String {
        let prefix: String = text.chars().take(chunking::ID_PREFIX_CHARS).collect();
        let digest = Sha256::digest(format!("{}_{}_{}", document_id, index, prefix).as_bytes());
        hex::encode(digest)[..chunking::ID_HEX_LEN].to_string()
    }

    /// Split text into fragments carrying consistent metadata
    ///
    /// Each fragment gets `source`, `doc_id`, position fields, a stable
    /// id, and everything in `extra_metadata` (which overrides the base
    /// fields on key collision).
    pub fn chunk_with_metadata(
        &self,
        text: &str,
        source: &str,
        document_id: &str,
        extra_metadata: &HashMap<String, serde_json::Value>,
    ) -> Vec<Fragment> {
        let chunks: Vec<String> = self
            .splitter
            .chunk(text)
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();
        let total = chunks.len();

        chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk_text)| {
                let id = Self::fragment_id(document_id, index, &chunk_text);
                let mut fragment =
                    Fragment::new(id.clone(), document_id, index, total, chunk_text);
                fragment
                    .metadata
                    .insert("source".to_string(), source.into());
                fragment
                    .metadata
                    .insert("doc_id".to_string(), document_id.into());
                fragment.metadata.insert("chunk_id".to_string(), id.into());
                for (key, value) in extra_metadata {
                    fragment.metadata.insert(key.clone(), value.clone());
                }
                fragment
            })
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn join(parts: &VecDeque<String>, sep: &str) -> String {
    parts.iter().cloned().collect::<Vec<_>>().join(sep)
}
