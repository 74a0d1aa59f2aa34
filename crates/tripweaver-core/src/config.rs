//! ============================================================================
//! Configuration - Models, search caps, and connection settings
//! ============================================================================
//! Model names and pipeline caps are compile-time constants; connection
//! settings come from the environment and are validated fail-fast so a
//! deployment with a missing variable dies at startup, not mid-request.
//! ============================================================================

use std::env;

use crate::error::{RagError, Result};

/// Embedding model (OpenAI compatible)
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Chat model for summarization and final generation
pub const CHAT_MODEL: &str = "gpt-4o-mini";

/// Expected embedding dimension for text-embedding-3-small
pub const VECTOR_DIM: usize = 1536;

/// Number of nearest neighbors requested from the vector index
pub const TOP_K: u64 = 5;

/// Cached embedding time-to-live: 30 days
pub const CACHE_TTL_SECS: u64 = 2_592_000;

/// Conversation window, counted in raw messages (not turn pairs)
pub const HISTORY_WINDOW: usize = 10;

/// Hard cap on graph facts returned by the one-hop expansion
pub const MAX_GRAPH_FACTS: usize = 200;

/// Connection settings for all collaborator services
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    /// OpenAI-compatible API base, e.g. "https://api.openai.com/v1"
    pub openai_base_url: String,
    pub qdrant_url: String,
    pub qdrant_collection: String,
    /// Neo4j HTTP API root, e.g. "http://localhost:7474"
    pub neo4j_http_url: String,
    pub neo4j_database: String,
    pub neo4j_username: String,
    pub neo4j_password: String,
    pub upstash_redis_url: String,
    pub upstash_redis_token: String,
}

impl Config {
    /// Load configuration from the environment, failing fast with a single
    /// error that lists every missing required variable.
    pub fn from_env() -> Result<Self> {
        let required = [
            "OPENAI_API_KEY",
            "QDRANT_URL",
            "QDRANT_COLLECTION",
            "NEO4J_HTTP_URL",
            "NEO4J_USERNAME",
            "NEO4J_PASSWORD",
            "UPSTASH_REDIS_URL",
            "UPSTASH_REDIS_TOKEN",
        ];

        let missing = missing_required(&required, |name| env::var(name).ok());
        if !missing.is_empty() {
            return Err(RagError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            qdrant_url: env::var("QDRANT_URL").unwrap_or_default(),
            qdrant_collection: env::var("QDRANT_COLLECTION").unwrap_or_default(),
            neo4j_http_url: env::var("NEO4J_HTTP_URL").unwrap_or_default(),
            neo4j_database: env::var("NEO4J_DATABASE").unwrap_or_else(|_| "neo4j".to_string()),
            neo4j_username: env::var("NEO4J_USERNAME").unwrap_or_default(),
            neo4j_password: env::var("NEO4J_PASSWORD").unwrap_or_default(),
            upstash_redis_url: env::var("UPSTASH_REDIS_URL").unwrap_or_default(),
            upstash_redis_token: env::var("UPSTASH_REDIS_TOKEN").unwrap_or_default(),
        })
    }
}

/// Names from `required` for which `lookup` yields no non-empty value
fn missing_required(required: &[&str], lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    required
        .iter()
        .filter(|name| lookup(name).map_or(true, |v| v.trim().is_empty()))
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_reports_all() {
        let missing = missing_required(&["A", "B", "C"], |name| match name {
            "B" => Some("set".to_string()),
            _ => None,
        });
        assert_eq!(missing, vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let missing = missing_required(&["A"], |_| Some("   ".to_string()));
        assert_eq!(missing, vec!["A".to_string()]);
    }

    #[test]
    fn test_all_present() {
        let missing = missing_required(&["A", "B"], |_| Some("value".to_string()));
        assert!(missing.is_empty());
    }
}
