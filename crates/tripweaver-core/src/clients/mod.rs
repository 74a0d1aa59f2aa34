//! ============================================================================
//! Collaborator Clients - Narrow contracts over external services
//! ============================================================================
//! Every remote capability the pipeline consumes sits behind an object-safe
//! trait so the orchestration code never names a vendor and tests can inject
//! in-memory doubles:
//! - EmbeddingApi:  text -> vector (OpenAI-compatible /embeddings)
//! - GenerationApi: messages -> completion text (/chat/completions)
//! - VectorIndex:   vector -> scored matches (Qdrant)
//! - GraphStore:    read query -> rows (Neo4j HTTP transaction endpoint)
//! - KvCache:       best-effort get/set with TTL (Upstash Redis REST)
//!
//! Concrete clients are constructed once at startup and shared for the
//! process lifetime; none of them opens per-call connections.
//! ============================================================================

mod neo4j;
mod openai;
mod qdrant;
mod upstash;

pub use neo4j::Neo4jHttpGraph;
pub use openai::OpenAiClient;
pub use qdrant::QdrantIndex;
pub use upstash::UpstashRedisCache;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::PromptMessage;

/// Embedding generation; may fail transiently
#[async_trait]
pub trait EmbeddingApi: Send + Sync {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>>;
}

/// Chat completion; may fail transiently
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        model: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;
}

/// A hit as the index reported it, before normalization.
///
/// Two shapes are known: field-wise records produced by the Qdrant client,
/// and mapping-style JSON objects (test doubles, alternative backends).
/// Anything else is a normalization error at the record level.
#[derive(Debug, Clone)]
pub enum RawMatch {
    Fields {
        id: Option<String>,
        score: Option<f32>,
        metadata: HashMap<String, String>,
    },
    Object(serde_json::Value),
}

/// Vector similarity search; results come back pre-sorted by the service
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, vector: Vec<f32>, top_k: u64) -> Result<Vec<RawMatch>>;
}

/// Read-only graph queries returning column-keyed JSON rows
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn run_read_query(
        &self,
        query: &str,
        params: serde_json::Value,
    ) -> Result<Vec<serde_json::Value>>;
}

/// Best-effort key-value cache; never authoritative
#[async_trait]
pub trait KvCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;
}
