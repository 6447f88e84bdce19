//! Document loading and indexing
//!
//! Loads plain-text publications from a data directory, attaches
//! extracted metadata, and feeds them through the chunker into the
//! vector index. Per-file failures are logged and skipped so one bad
//! file never aborts an ingestion run.

use std::path::{Path, PathBuf};

use pubs_assistant_core::Document;

use crate::chunker::MetadataChunker;
use crate::metadata::MetadataExtractor;
use crate::vector_store::VectorIndex;
use crate::RagError;

/// Loader for text documents with metadata extraction
pub struct DocumentLoader {
    data_folder: PathBuf,
    extractor: MetadataExtractor,
}

impl DocumentLoader {
    /// Create a loader over a data directory
    pub fn new(data_folder: impl Into<PathBuf>, extractor: MetadataExtractor) -> Self {
        Self {
            data_folder: data_folder.into(),
            extractor,
        }
    }

    /// Load every `.txt` document in the data directory
    ///
    /// Empty files and files with whitespace-only content are skipped;
    /// undecodable files are logged and skipped. Returns documents in
    /// filename order.
    pub fn load_all(&self) -> Result<Vec<Document>, RagError> {
        let files = self.find_txt_files()?;

        if files.is_empty() {
            tracing::info!(
                path = %self.data_folder.display(),
                "No .txt files found in data folder"
            );
            return Ok(Vec::new());
        }

        tracing::info!(files = files.len(), "Found .txt files to process");

        let mut documents = Vec::new();
        for path in files {
            match self.load_file(&path) {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {
                    tracing::debug!(file = %path.display(), "Skipping empty file");
                }
                Err(e) => {
                    tracing::error!(file = %path.display(), error = %e, "Failed to load file");
                }
            }
        }

        tracing::info!(documents = documents.len(), "Document loading complete");
        Ok(documents)
    }

    fn load_file(&self, path: &Path) -> Result<Option<Document>, RagError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RagError::Ingest(format!("failed to read {}: {}", path.display(), e)))?;

        if text.trim().is_empty() {
            return Ok(None);
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let metadata = self.extractor.extract(&text, filename);

        let mut document = Document::from_filename(filename, text);
        document.metadata = metadata;

        tracing::debug!(
            document_id = %document.document_id,
            words = document.word_count(),
            "Loaded document"
        );

        Ok(Some(document))
    }

    fn find_txt_files(&self) -> Result<Vec<PathBuf>, RagError> {
        if !self.data_folder.is_dir() {
            tracing::warn!(
                path = %self.data_folder.display(),
                "Data folder does not exist or is not a directory"
            );
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.data_folder)
            .map_err(|e| RagError::Ingest(format!("failed to read data folder: {}", e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("txt"))
            .collect();
        files.sort();

        Ok(files)
    }
}

/// Chunk and index documents, returning the fragment count
pub fn index_documents(
    chunker: &MetadataChunker,
    index: &dyn VectorIndex,
    documents: &[Document],
) -> Result<usize, RagError> {
    let mut total_fragments = 0;

    for document in documents {
        let source = document
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        let fragments = chunker.chunk_with_metadata(
            &document.text,
            &source,
            &document.document_id,
            &document.metadata,
        );

        index.add(&fragments)?;
        total_fragments += fragments.len();

        tracing::debug!(
            document_id = %document.document_id,
            fragments = fragments.len(),
            "Indexed document"
        );
    }

    tracing::info!(
        documents = documents.len(),
        fragments = total_fragments,
        "Ingestion complete"
    );

    Ok(total_fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkConfig;
    use crate::embeddings::HashEmbedder;
    use crate::vector_store::InMemoryIndex;
    use std::sync::Arc;

    fn write_file(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_all_skips_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "pub_one.txt", "Deutsche Telekom expands 5G coverage.");
        write_file(dir.path(), "pub_two.txt", "   \n  ");
        write_file(dir.path(), "notes.md", "Not a publication.");

        let loader = DocumentLoader::new(dir.path(), MetadataExtractor::new("Deutsche Telekom"));
        let documents = loader.load_all().unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].document_id, "pub_one");
        assert_eq!(
            documents[0].metadata.get("publication_id").and_then(|v| v.as_str()),
            Some("pub_one")
        );
    }

    #[test]
    fn test_load_all_missing_folder_is_empty() {
        let loader = DocumentLoader::new(
            "/nonexistent/data/folder",
            MetadataExtractor::new("Deutsche Telekom"),
        );
        assert!(loader.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_documents_load_in_filename_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b_second.txt", "Second publication body.");
        write_file(dir.path(), "a_first.txt", "First publication body.");

        let loader = DocumentLoader::new(dir.path(), MetadataExtractor::new("Deutsche Telekom"));
        let documents = loader.load_all().unwrap();

        let ids: Vec<&str> = documents.iter().map(|d| d.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a_first", "b_second"]);
    }

    #[test]
    fn test_index_documents_counts_fragments() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "pub_5g.txt",
            "Deutsche Telekom offers 5G network services across Germany.",
        );
        write_file(
            dir.path(),
            "pub_cloud.txt",
            "Telekom provides secure cloud solutions for enterprises.",
        );

        let loader = DocumentLoader::new(dir.path(), MetadataExtractor::new("Deutsche Telekom"));
        let documents = loader.load_all().unwrap();

        let chunker = MetadataChunker::new(ChunkConfig::default()).unwrap();
        let index = InMemoryIndex::new(Arc::new(HashEmbedder::default()));

        let count = index_documents(&chunker, &index, &documents).unwrap();

        assert_eq!(count, 2);
        assert_eq!(index.count().unwrap(), 2);
    }
}
