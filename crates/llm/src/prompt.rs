//! Prompt assembly
//!
//! Builds the structured turn sequence handed to generation: a fixed
//! system persona, a behavioral anchor exchange, prior conversation
//! turns, and a numbered context block of excerpted fragments. The
//! assembler guarantees a well-formed prompt even with no retrieved
//! context, and never emits a fragment without a resolvable source
//! label.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use pubs_assistant_config::constants::prompt::EMPTY_CONTEXT_MARKER;
use pubs_assistant_config::PromptConfig;
use pubs_assistant_core::Fragment;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Estimate token count (~4 graphemes per token)
    pub fn estimate_tokens(&self) -> usize {
        self.content.graphemes(true).count().max(1) / 4
    }
}

/// Assembles retrieval-augmented prompts
pub struct PromptAssembler {
    config: PromptConfig,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(PromptConfig::default())
    }
}

impl PromptAssembler {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// Fixed system persona: role plus citation obligations
    fn system_prompt(&self) -> String {
        format!(
            r#"You are an enterprise AI assistant for {org}.
Your role is to deliver accurate, well-reasoned insights grounded in the provided publications.

Guidelines:
- Base all answers on the provided context documents, but you may synthesize or infer relationships between them.
- If specific information is missing, explicitly state that it is not available.
- Maintain a confident, professional tone consistent with {org} communications.
- Cite publication IDs when drawing on particular sources (e.g., "(Publication 12)").
- Avoid speculation or repetition. Respond with a clear, concise, and factual summary."#,
            org = self.config.organization,
        )
    }

    /// Resolve the citation label for a fragment
    ///
    /// Falls back through the configured metadata keys, then the
    /// fragment's document id, then a positional `doc_N` placeholder.
    /// A fragment is never surfaced without a label.
    pub fn resolve_source_label(&self, fragment: &Fragment, position: usize) -> String {
        for key in &self.config.source_id_keys {
            if let Some(value) = fragment.metadata_str(key) {
                if !value.is_empty() {
                    return value.to_string();
                }
            }
        }

        if !fragment.document_id.is_empty() {
            return fragment.document_id.clone();
        }

        format!("doc_{}", position)
    }

    /// Format fragments as numbered sources with excerpts
    fn format_context_block(&self, fragments: &[Fragment]) -> String {
        if fragments.is_empty() {
            return EMPTY_CONTEXT_MARKER.to_string();
        }

        let mut lines = Vec::with_capacity(fragments.len());
        for (position, fragment) in fragments.iter().enumerate() {
            let position = position + 1;
            let label = self.resolve_source_label(fragment, position);

            let mut excerpt: String = fragment
                .text
                .chars()
                .take(self.config.excerpt_max_chars)
                .collect();
            excerpt = excerpt.trim().to_string();
            if fragment.text.chars().count() > self.config.excerpt_max_chars {
                excerpt.push_str("...");
            }

            lines.push(format!(
                "{}. [Publication ID: {}]\n{}\n",
                position, label, excerpt
            ));
        }

        lines.join("\n")
    }

    /// Build the full prompt turn sequence
    ///
    /// Order: system persona, behavioral anchor pair, conversation
    /// history verbatim, then the final user turn embedding the query
    /// and the context block. Empty-content history turns are dropped so
    /// no turn in the output is ever empty.
    pub fn build_prompt(
        &self,
        query: &str,
        context_fragments: &[Fragment],
        chat_history: &[Message],
    ) -> Vec<Message> {
        let context_block = self.format_context_block(context_fragments);

        let mut messages = vec![
            Message::system(self.system_prompt()),
            Message::user(
                "Remember: if information is absent from the provided context, state clearly \
                 that it is unavailable. Always cite publication IDs when using sources.",
            ),
            Message::assistant(
                "Understood. I will base answers strictly on the provided context, cite \
                 publication IDs when relevant, and indicate when data is missing.",
            ),
        ];

        for turn in chat_history {
            if turn.content.trim().is_empty() {
                tracing::debug!(role = %turn.role, "Dropping empty history turn");
                continue;
            }
            messages.push(turn.clone());
        }

        let user_content = format!(
            "{}\n\nContext documents:\n{}\n\nRespond with a single, well-structured answer. \
             Do not restate or list the context verbatim; focus on reasoned synthesis.",
            query.trim(),
            context_block,
        );
        messages.push(Message::user(user_content));

        messages
    }

    /// Estimate the token footprint of a prompt
    pub fn estimate_prompt_tokens(messages: &[Message]) -> usize {
        messages.iter().map(Message::estimate_tokens).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment_with_pub_id(id: &str, text: &str, publication_id: &str) -> Fragment {
        Fragment::new(id, "some_doc", 0, 1, text)
            .with_metadata("publication_id", publication_id)
    }

    fn assembler() -> PromptAssembler {
        PromptAssembler::default()
    }

    #[test]
    fn test_prompt_shape() {
        let fragments = vec![fragment_with_pub_id("f1", "5G rollout details.", "pub_1")];
        let messages = assembler().build_prompt("What about 5G?", &fragments, &[]);

        // System persona, anchor pair, final user turn
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[3].role, Role::User);
        assert!(messages[3].content.contains("What about 5G?"));
        assert!(messages[3].content.contains("Context documents:"));
    }

    #[test]
    fn test_no_turn_is_empty() {
        let history = vec![
            Message::user("Earlier question"),
            Message::assistant(""),
            Message::user("   "),
        ];
        let messages = assembler().build_prompt("query", &[], &history);

        for message in &messages {
            assert!(!message.content.trim().is_empty());
        }
        // Only the non-empty history turn survives
        assert_eq!(messages.len(), 5);
    }

    #[test]
    fn test_anchor_precedes_history() {
        let history = vec![Message::user("Previous question about fiber.")];
        let messages = assembler().build_prompt("query", &[], &history);

        assert!(messages[2].content.contains("Understood"));
        assert_eq!(messages[3].content, "Previous question about fiber.");
    }

    #[test]
    fn test_empty_context_renders_marker() {
        let messages = assembler().build_prompt("query", &[], &[]);
        let final_turn = messages.last().unwrap();

        assert!(final_turn.content.contains("No relevant documents found."));
    }

    #[test]
    fn test_context_block_numbering_and_labels() {
        let fragments = vec![
            fragment_with_pub_id("f1", "First fragment text.", "pub_a"),
            fragment_with_pub_id("f2", "Second fragment text.", "pub_b"),
        ];
        let messages = assembler().build_prompt("query", &fragments, &[]);
        let final_turn = &messages.last().unwrap().content;

        assert!(final_turn.contains("1. [Publication ID: pub_a]"));
        assert!(final_turn.contains("2. [Publication ID: pub_b]"));
    }

    #[test]
    fn test_label_falls_back_through_chain() {
        let assembler = assembler();

        // publication_id missing, doc_id metadata present
        let frag = Fragment::new("f1", "owner_doc", 0, 1, "text")
            .with_metadata("doc_id", "meta_doc");
        assert_eq!(assembler.resolve_source_label(&frag, 1), "meta_doc");

        // No metadata at all: document id field
        let frag = Fragment::new("f2", "owner_doc", 0, 1, "text");
        assert_eq!(assembler.resolve_source_label(&frag, 2), "owner_doc");

        // Nothing resolvable: positional placeholder
        let frag = Fragment::new("f3", "", 0, 1, "text");
        assert_eq!(assembler.resolve_source_label(&frag, 3), "doc_3");
    }

    #[test]
    fn test_every_fragment_gets_a_label() {
        let fragments = vec![
            fragment_with_pub_id("f1", "Labeled fragment.", "pub_x"),
            Fragment::new("f2", "", 0, 1, "Unlabeled fragment."),
        ];
        let messages = assembler().build_prompt("query", &fragments, &[]);
        let final_turn = &messages.last().unwrap().content;

        assert!(final_turn.contains("[Publication ID: pub_x]"));
        assert!(final_turn.contains("[Publication ID: doc_2]"));
    }

    #[test]
    fn test_excerpt_truncation() {
        let long_text = "x".repeat(2000);
        let fragments = vec![fragment_with_pub_id("f1", &long_text, "pub_long")];
        let messages = assembler().build_prompt("query", &fragments, &[]);
        let final_turn = &messages.last().unwrap().content;

        let excerpt_line = final_turn
            .lines()
            .find(|l| l.starts_with('x'))
            .expect("excerpt line present");
        assert!(excerpt_line.ends_with("..."));
        assert_eq!(excerpt_line.chars().count(), 800 + 3);
    }

    #[test]
    fn test_short_fragment_not_truncated() {
        let fragments = vec![fragment_with_pub_id("f1", "Short text.", "pub_s")];
        let messages = assembler().build_prompt("query", &fragments, &[]);
        let final_turn = &messages.last().unwrap().content;

        assert!(final_turn.contains("Short text.\n"));
        assert!(!final_turn.contains("Short text...."));
    }

    #[test]
    fn test_estimate_tokens_positive() {
        let messages = assembler().build_prompt("How big is the network?", &[], &[]);
        assert!(PromptAssembler::estimate_prompt_tokens(&messages) > 0);
    }
}
