//! ============================================================================
//! Pipeline Module - RAG orchestration for the travel assistant
//! ============================================================================
//! Wires the stages into one linear flow per request:
//!
//! ```text
//! query → embed (cached) → vector search → one-hop graph expansion
//!       → context summary → prompt assembly (+ history) → generation
//!       → answer + windowed history
//! ```
//!
//! The pipeline holds every collaborator in an explicit context object
//! (`Arc<dyn Trait>` fields) built once at startup; there is no global
//! client state and no per-call connection setup.
//! ============================================================================

pub mod embedding;
pub mod prompt;
pub mod retrieval;
pub mod summarize;

pub use embedding::{derive_key, CacheLookup, EmbeddingResolver};
pub use prompt::{build_chat_prompt, OUT_OF_DOMAIN_REFUSAL};
pub use retrieval::HybridRetriever;
pub use summarize::ContextSummarizer;

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::clients::{EmbeddingApi, GenerationApi, GraphStore, KvCache, VectorIndex};
use crate::config::{
    CACHE_TTL_SECS, CHAT_MODEL, EMBED_MODEL, HISTORY_WINDOW, TOP_K, VECTOR_DIM,
};
use crate::error::Result;
use crate::history;
use crate::retry::{with_retries, RetryConfig};
use crate::types::{ChatOutcome, ConversationTurn};

/// Generation budget for the final answer
const ANSWER_MAX_TOKENS: u32 = 600;
const ANSWER_TEMPERATURE: f32 = 0.2;

/// Tunable knobs of the pipeline; defaults mirror the config constants
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub embed_model: String,
    pub chat_model: String,
    pub vector_dim: usize,
    pub top_k: u64,
    pub cache_ttl_secs: u64,
    pub history_window: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            embed_model: EMBED_MODEL.to_string(),
            chat_model: CHAT_MODEL.to_string(),
            vector_dim: VECTOR_DIM,
            top_k: TOP_K,
            cache_ttl_secs: CACHE_TTL_SECS,
            history_window: HISTORY_WINDOW,
        }
    }
}

/// The full retrieval-augmentation-generation pipeline.
///
/// Stateless between calls: conversation history lives with the caller and
/// is passed in and handed back on every request.
pub struct ChatPipeline {
    retriever: HybridRetriever,
    summarizer: ContextSummarizer,
    generation: Arc<dyn GenerationApi>,
    settings: PipelineSettings,
    retry: RetryConfig,
}

impl ChatPipeline {
    pub fn new(
        embeddings: Arc<dyn EmbeddingApi>,
        generation: Arc<dyn GenerationApi>,
        index: Arc<dyn VectorIndex>,
        graph: Arc<dyn GraphStore>,
        cache: Arc<dyn KvCache>,
        settings: PipelineSettings,
    ) -> Self {
        let resolver = EmbeddingResolver::new(
            embeddings,
            cache,
            settings.embed_model.clone(),
            settings.vector_dim,
            settings.cache_ttl_secs,
        );
        let retriever = HybridRetriever::new(resolver, index, graph);
        let summarizer = ContextSummarizer::new(
            generation.clone(),
            settings.chat_model.clone(),
            settings.top_k as usize,
        );

        Self {
            retriever,
            summarizer,
            generation,
            settings,
            retry: RetryConfig::default(),
        }
    }

    /// Answer one query, grounded in retrieved context and prior turns.
    ///
    /// `history` is the caller's window from previous calls (empty for a new
    /// conversation); the returned outcome carries the updated window.
    pub async fn answer(
        &self,
        query: &str,
        conversation_id: Option<String>,
        history: Vec<ConversationTurn>,
    ) -> Result<ChatOutcome> {
        let (matches, facts) = self.retriever.retrieve(query, self.settings.top_k).await?;
        let source_ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();
        info!(
            "Retrieved {} matches and {} graph facts",
            matches.len(),
            facts.len()
        );

        let summary = self.summarizer.summarize(query, &matches, &facts).await?;

        let messages = build_chat_prompt(query, &summary, &history);
        let answer = with_retries(&self.retry, || {
            self.generation.complete(
                &messages,
                &self.settings.chat_model,
                ANSWER_MAX_TOKENS,
                ANSWER_TEMPERATURE,
            )
        })
        .await?;

        let conversation_id =
            conversation_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let updated_history = history::cap(
            history::append(
                history,
                ConversationTurn::user(query),
                ConversationTurn::assistant(answer.clone()),
            ),
            self.settings.history_window,
        );

        Ok(ChatOutcome {
            answer,
            source_ids,
            conversation_id,
            updated_history,
        })
    }
}
