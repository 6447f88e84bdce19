//! Document and fragment types
//!
//! A `Document` is a unit of source content produced by the loader; the
//! chunker consumes it once and emits `Fragment`s, the unit of retrieval.
//! Fragments are immutable after creation and owned by the vector index
//! once added.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A source document prior to chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Identifier derived from the source filename (stem, no extension)
    pub document_id: String,
    /// Full text content
    pub text: String,
    /// Descriptive metadata (publication id, word count, topics, dates,
    /// entities, source label)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a new document
    pub fn new(document_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    /// Create a document whose id is the filename stem
    pub fn from_filename(filename: &str, text: impl Into<String>) -> Self {
        let document_id = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename)
            .to_string();
        Self::new(document_id, text)
    }

    /// Attach a metadata value
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Word count of the full text
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A chunked, independently retrievable piece of a source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Stable content-addressed identifier
    pub id: String,
    /// Owning document's identifier
    pub document_id: String,
    /// Position within the source document
    pub index: usize,
    /// Total fragments produced from the source document
    pub total: usize,
    /// Fragment text content (never empty)
    pub text: String,
    /// Metadata inherited from the source document plus derived fields
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Fragment {
    /// Create a new fragment
    pub fn new(
        id: impl Into<String>,
        document_id: impl Into<String>,
        index: usize,
        total: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            document_id: document_id.into(),
            index,
            total,
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata value
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up a metadata value as a string, if present and string-typed
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_from_filename() {
        let doc = Document::from_filename("press_release_042.txt", "Some content");
        assert_eq!(doc.document_id, "press_release_042");
    }

    #[test]
    fn test_document_word_count() {
        let doc = Document::new("d1", "one two three");
        assert_eq!(doc.word_count(), 3);
    }

    #[test]
    fn test_fragment_metadata_lookup() {
        let frag = Fragment::new("abc", "d1", 0, 1, "text")
            .with_metadata("publication_id", "pub_7")
            .with_metadata("word_count", 42);

        assert_eq!(frag.metadata_str("publication_id"), Some("pub_7"));
        assert_eq!(frag.metadata_str("word_count"), None);
        assert_eq!(frag.metadata_str("missing"), None);
    }
}
