//! ============================================================================
//! Context Summarizer - Compress retrieved context into bullet points
//! ============================================================================
//! Renders the matches and graph facts into a bounded synthesis request and
//! asks the generation service for a concise, id-cited summary. Every field
//! is truncated before submission; the caps are a hard token-budget
//! safeguard, not a formatting nicety.
//! ============================================================================

use std::sync::Arc;

use crate::clients::GenerationApi;
use crate::error::Result;
use crate::retry::{with_retries, RetryConfig};
use crate::text::truncate;
use crate::types::{GraphFact, PromptMessage, RetrievalMatch, Role};

/// At most this many facts are rendered into the synthesis request
const FACTS_CAP: usize = 120;

/// Field caps, in characters
const NAME_MAX: usize = 80;
const DESC_MAX: usize = 300;
const TARGET_MAX: usize = 120;
const QUERY_MAX: usize = 800;

/// Synthesizes retrieved candidates and facts into a short summary
pub struct ContextSummarizer {
    generation: Arc<dyn GenerationApi>,
    model: String,
    matches_cap: usize,
    retry: RetryConfig,
}

impl ContextSummarizer {
    pub fn new(generation: Arc<dyn GenerationApi>, model: impl Into<String>, matches_cap: usize) -> Self {
        Self {
            generation,
            model: model.into(),
            matches_cap,
            retry: RetryConfig::default(),
        }
    }

    /// Produce a bounded natural-language summary of the retrieved context
    pub async fn summarize(
        &self,
        query: &str,
        matches: &[RetrievalMatch],
        facts: &[GraphFact],
    ) -> Result<String> {
        let content = self.synthesis_request(query, matches, facts);
        let messages = [PromptMessage::new(Role::User, content)];

        with_retries(&self.retry, || {
            self.generation.complete(&messages, &self.model, 350, 0.1)
        })
        .await
    }

    fn synthesis_request(
        &self,
        query: &str,
        matches: &[RetrievalMatch],
        facts: &[GraphFact],
    ) -> String {
        let vec_context = matches
            .iter()
            .take(self.matches_cap)
            .map(|m| {
                format!(
                    "- Name: {}, Description: {} (id: {})",
                    truncate(m.meta("name"), NAME_MAX),
                    truncate(m.meta("description"), DESC_MAX),
                    m.id
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let graph_context = facts
            .iter()
            .take(FACTS_CAP)
            .map(|f| {
                let source = if f.source_name.is_empty() {
                    f.source_id.as_str()
                } else {
                    f.source_name.as_str()
                };
                let target = if f.target_name.is_empty() {
                    f.target_id.as_str()
                } else {
                    f.target_name.as_str()
                };
                format!(
                    "- {} ({}) {} {} ({})",
                    truncate(source, NAME_MAX),
                    f.source_id,
                    f.rel,
                    truncate(target, TARGET_MAX),
                    f.target_id
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a data synthesizer for a travel assistant. Your task is to process raw data and create a clean summary. Follow these steps:\n\
             1. If a result has a generic name (e.g., 'Attraction 123'), you may invent a plausible descriptive name using its description (e.g., 'Golden Hand Bridge'). Mark invented names with [inferred].\n\
             2. Based on the user's query and ALL provided data, create a concise summary of the most relevant places and their relationships.\n\
             3. Format the summary as a few bullet points. Always include the original node IDs in parentheses.\n\n\
             User Query: \"{}\"\n\n\
             Top Search Results:\n{}\n\n\
             Knowledge Graph Facts:\n{}\n\n\
             Concise Summary (in bullet points, using improved names where needed):",
            truncate(query, QUERY_MAX),
            vec_context,
            graph_context
        )
    }
}
