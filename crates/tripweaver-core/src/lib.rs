//! ============================================================================
//! TRIPWEAVER-CORE: Hybrid RAG engine for the travel assistant
//! ============================================================================
//! This crate holds all pipeline logic for Tripweaver:
//! - Cache-first embedding resolution with strict dimension validation
//! - Hybrid retrieval: vector similarity search plus one-hop graph facts
//! - Context summarization and final prompt assembly
//! - Bounded conversation history windowing
//!
//! Front ends (CLI, HTTP) stay thin: they build a `ChatPipeline` from the
//! concrete clients in `clients`, call `answer`, and map every error to a
//! uniform user-facing message.
//! ============================================================================

pub mod clients;
pub mod config;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod retry;
pub mod text;
pub mod types;

// Re-export the main surface for convenience
pub use config::Config;
pub use error::{RagError, Result};
pub use pipeline::{ChatPipeline, PipelineSettings, OUT_OF_DOMAIN_REFUSAL};
pub use types::{ChatOutcome, ConversationTurn, GraphFact, PromptMessage, RetrievalMatch, Role};
