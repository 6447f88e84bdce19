//! Publication metadata extraction
//!
//! Derives descriptive metadata from raw text and a filename: a
//! publication id, word count, keyword-bucket topics, mentioned dates,
//! and mentioned entities. Every fragment produced from a document
//! inherits this mapping.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use pubs_assistant_config::constants::metadata::ENTITY_LIMIT;

/// Dates as DD.MM.YYYY or YYYY-MM-DD
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{2}\.\d{2}\.\d{4}|\d{4}-\d{2}-\d{2})\b").expect("date pattern is valid")
});

/// Topic keyword buckets
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("5G", &["5g", "5-g", "fifth generation"]),
    (
        "Security",
        &["security", "cybersecurity", "secure", "protection", "safety", "encryption"],
    ),
    (
        "Partnership",
        &["partnership", "partner", "collaboration", "alliance", "joint", "cooperation"],
    ),
    (
        "Product",
        &["product", "service", "solution", "offering", "platform", "tool"],
    ),
    (
        "Sustainability",
        &["sustainability", "sustainable", "environment", "climate", "green", "carbon", "renewable"],
    ),
];

/// Extracts publication metadata from text content
pub struct MetadataExtractor {
    source: String,
}

impl MetadataExtractor {
    /// Create an extractor stamping the given source label
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Extract the full metadata mapping for a document
    ///
    /// Includes `publication_id` (filename stem), `source`,
    /// `extracted_at`, `word_count`, `mentioned_dates`, `topics`, and
    /// `mentioned_entities` (capped at 10).
    pub fn extract(&self, text: &str, filename: &str) -> HashMap<String, serde_json::Value> {
        let publication_id = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename)
            .to_string();

        let mut metadata = HashMap::new();
        metadata.insert("publication_id".to_string(), publication_id.into());
        metadata.insert("source".to_string(), self.source.clone().into());
        metadata.insert(
            "extracted_at".to_string(),
            Utc::now().to_rfc3339().into(),
        );
        metadata.insert("word_count".to_string(), count_words(text).into());
        metadata.insert(
            "mentioned_dates".to_string(),
            serde_json::Value::from(extract_dates(text)),
        );
        metadata.insert(
            "topics".to_string(),
            serde_json::Value::from(extract_topics(text)),
        );
        metadata.insert(
            "mentioned_entities".to_string(),
            serde_json::Value::from(extract_entities(text, ENTITY_LIMIT)),
        );

        metadata
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn extract_dates(text: &str) -> Vec<String> {
    DATE_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn extract_topics(text: &str) -> Vec<String> {
    let text_lower = text.to_lowercase();

    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text_lower.contains(k)))
        .map(|(topic, _)| topic.to_string())
        .collect()
}

/// Entity heuristic: consecutive capitalized alphabetic words (bigrams),
/// neither all-caps, deduplicated in order of first appearance
fn extract_entities(text: &str, limit: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    let mut entities = Vec::new();
    let mut seen = HashSet::new();

    for pair in words.windows(2) {
        let first = pair[0].trim_matches(|c: char| c.is_ascii_punctuation());
        let second = pair[1].trim_matches(|c: char| c.is_ascii_punctuation());

        if is_capitalized_word(first) && is_capitalized_word(second) {
            let bigram = format!("{} {}", first, second);
            if seen.insert(bigram.clone()) {
                entities.push(bigram);
                if entities.len() >= limit {
                    break;
                }
            }
        }
    }

    entities
}

fn is_capitalized_word(word: &str) -> bool {
    !word.is_empty()
        && word.chars().all(|c| c.is_alphabetic())
        && word.chars().next().is_some_and(|c| c.is_uppercase())
        && word != word.to_uppercase()
}
