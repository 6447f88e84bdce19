//! Answering service
//!
//! Control flow per query: retrieve ranked fragments, assemble the
//! prompt around them plus conversation history, generate, and return
//! the answer text with the cited source labels.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use pubs_assistant_config::constants::rag::MAX_TOP_K;
use pubs_assistant_config::Settings;
use pubs_assistant_core::Result;
use pubs_assistant_llm::{GenerationParams, Message, PromptAssembler, TextGenerator};
use pubs_assistant_rag::{RetrievalEngine, SearchFilter};

/// Generated answer with cited sources
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Generated answer text
    pub text: String,
    /// Resolved source labels of the fragments used, deduplicated, in
    /// order of appearance
    pub sources: Vec<String>,
}

/// The assistant service
///
/// Constructed once at process start; request handlers share it by
/// reference. All calls are synchronous and block until complete.
pub struct Assistant {
    engine: RetrievalEngine,
    assembler: PromptAssembler,
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
}

impl Assistant {
    /// Create an assistant from explicit parts
    pub fn new(
        engine: RetrievalEngine,
        assembler: PromptAssembler,
        generator: Arc<dyn TextGenerator>,
        params: GenerationParams,
    ) -> Self {
        Self {
            engine,
            assembler,
            generator,
            params,
        }
    }

    /// Create an assistant from settings, a prepared engine, and a
    /// generation backend
    pub fn from_settings(
        settings: &Settings,
        engine: RetrievalEngine,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self::new(
            engine,
            PromptAssembler::new(settings.prompt.clone()),
            generator,
            GenerationParams::from(&settings.generation),
        )
    }

    /// Answer a query using the engine's configured top-k
    pub fn answer(&self, query: &str, history: &[Message]) -> Result<Answer> {
        self.answer_with_options(query, history, None, None)
    }

    /// Answer a query with an explicit top-k and/or metadata filter
    ///
    /// The requested top-k is clamped to `1..=20`.
    pub fn answer_with_options(
        &self,
        query: &str,
        history: &[Message],
        top_k: Option<usize>,
        filter: Option<&SearchFilter>,
    ) -> Result<Answer> {
        let started = Instant::now();
        let config = self.engine.config();
        let top_k = top_k.unwrap_or(config.top_k).clamp(1, MAX_TOP_K);

        let fragments = self
            .engine
            .retrieve(query, top_k, config.rerank_top_k, filter)?;

        let prompt = self.assembler.build_prompt(query, &fragments, history);
        let text = self.generator.generate(&prompt, &self.params)?;

        let mut sources = Vec::new();
        for (position, fragment) in fragments.iter().enumerate() {
            let label = self.assembler.resolve_source_label(fragment, position + 1);
            if !sources.contains(&label) {
                sources.push(label);
            }
        }

        tracing::info!(
            fragments = fragments.len(),
            sources = sources.len(),
            model = self.generator.model_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Answered query"
        );

        Ok(Answer { text, sources })
    }

    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pubs_assistant_llm::LlmError;
    use pubs_assistant_rag::{
        Embedder, HashEmbedder, InMemoryIndex, RetrieverConfig, VectorIndex,
    };
    use pubs_assistant_core::Fragment;

    /// Generator returning canned text and recording the prompt it saw
    struct ScriptedGenerator {
        response: String,
        last_prompt: Mutex<Vec<Message>>,
    }

    impl ScriptedGenerator {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                last_prompt: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate(
            &self,
            messages: &[Message],
            _params: &GenerationParams,
        ) -> std::result::Result<String, LlmError> {
            *self.last_prompt.lock() = messages.to_vec();
            Ok(self.response.clone())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn sample_fragment(id: &str, text: &str, publication_id: &str) -> Fragment {
        Fragment::new(id, publication_id, 0, 1, text)
            .with_metadata("publication_id", publication_id)
    }

    fn populated_index() -> Arc<InMemoryIndex> {
        let index = Arc::new(InMemoryIndex::new(Arc::new(HashEmbedder::default())));
        index
            .add(&[
                sample_fragment(
                    "f1",
                    "Deutsche Telekom offers 5G network services across Germany.",
                    "pub_5g",
                ),
                sample_fragment(
                    "f2",
                    "Telekom provides secure cloud solutions for enterprises.",
                    "pub_security",
                ),
                sample_fragment(
                    "f3",
                    "Partnership with Microsoft enhances cloud capabilities.",
                    "pub_partnership",
                ),
            ])
            .unwrap();
        index
    }

    fn assistant_over(
        index: Arc<InMemoryIndex>,
        generator: Arc<ScriptedGenerator>,
    ) -> Assistant {
        Assistant::new(
            RetrievalEngine::new(index, RetrieverConfig::default()),
            PromptAssembler::default(),
            generator,
            GenerationParams::default(),
        )
    }

    #[test]
    fn test_answer_carries_sources() {
        let generator = Arc::new(ScriptedGenerator::new("The 5G rollout is broad."));
        let assistant = assistant_over(populated_index(), generator.clone());

        let answer = assistant
            .answer_with_options("5G network", &[], Some(1), None)
            .unwrap();

        assert_eq!(answer.text, "The 5G rollout is broad.");
        assert_eq!(answer.sources, vec!["pub_5g".to_string()]);

        // The generator saw a full prompt ending in the user turn
        let prompt = generator.last_prompt.lock();
        assert!(prompt.len() >= 4);
        assert!(prompt.last().unwrap().content.contains("5G network"));
    }

    #[test]
    fn test_answer_with_empty_index_is_well_formed() {
        let index = Arc::new(InMemoryIndex::new(Arc::new(HashEmbedder::default())));
        let generator = Arc::new(ScriptedGenerator::new(
            "That information is not available in the provided context.",
        ));
        let assistant = assistant_over(index, generator.clone());

        let answer = assistant.answer("anything at all", &[]).unwrap();

        assert!(answer.sources.is_empty());
        let prompt = generator.last_prompt.lock();
        assert!(prompt
            .last()
            .unwrap()
            .content
            .contains("No relevant documents found."));
    }

    #[test]
    fn test_sources_are_deduplicated() {
        let index = Arc::new(InMemoryIndex::new(Arc::new(HashEmbedder::default())));
        // Two fragments of the same publication
        index
            .add(&[
                sample_fragment("f1", "5G coverage grows in Berlin.", "pub_5g"),
                {
                    let mut f =
                        sample_fragment("f2", "5G coverage grows in Hamburg.", "pub_5g");
                    f.index = 1;
                    f.total = 2;
                    f
                },
            ])
            .unwrap();
        let generator = Arc::new(ScriptedGenerator::new("Coverage is growing."));
        let assistant = assistant_over(index, generator);

        let answer = assistant
            .answer_with_options("5G coverage", &[], Some(2), None)
            .unwrap();

        assert_eq!(answer.sources, vec!["pub_5g".to_string()]);
    }

    #[test]
    fn test_requested_top_k_is_clamped() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let index = Arc::new(InMemoryIndex::new(embedder));
        let fragments: Vec<Fragment> = (0..30)
            .map(|i| {
                sample_fragment(
                    &format!("f{}", i),
                    &format!("network fragment number {}", i),
                    &format!("pub_{}", i),
                )
            })
            .collect();
        index.add(&fragments).unwrap();

        let generator = Arc::new(ScriptedGenerator::new("ok"));
        let assistant = assistant_over(index, generator);

        let answer = assistant
            .answer_with_options("network fragment", &[], Some(100), None)
            .unwrap();

        // Clamped to the hard ceiling of 20
        assert!(answer.sources.len() <= 20);
        assert!(!answer.sources.is_empty());
    }
}
