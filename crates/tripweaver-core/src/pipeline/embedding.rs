//! ============================================================================
//! Embedding Resolver - Cache-first embedding generation
//! ============================================================================
//! Derives a deterministic cache key, consults the cache, and only then
//! calls the embedding service (through the retry executor). Vectors of the
//! wrong length are rejected outright; a wrong-dimension vector is a
//! model/config bug, never something to pad or truncate.
//! ============================================================================

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::clients::{EmbeddingApi, KvCache};
use crate::error::{RagError, Result};
use crate::retry::{with_retries, RetryConfig};

/// Deterministic fingerprint for a cacheable embedding request.
///
/// SHA-256 of the UTF-8 text, namespaced by the embedding model tag so a
/// model upgrade can never serve stale vectors.
pub fn derive_key(text: &str, model: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("embed:v1:{model}:{digest:x}")
}

/// Outcome of a cache probe. Corrupt entries are explicit, not an error
/// path: they are handled exactly like misses and trigger regeneration.
#[derive(Debug)]
pub enum CacheLookup {
    Hit(Vec<f32>),
    Miss,
    Corrupt,
}

/// Produces embedding vectors, consulting the cache before the service
pub struct EmbeddingResolver {
    api: Arc<dyn EmbeddingApi>,
    cache: Arc<dyn KvCache>,
    model: String,
    dimension: usize,
    ttl_secs: u64,
    retry: RetryConfig,
}

impl EmbeddingResolver {
    pub fn new(
        api: Arc<dyn EmbeddingApi>,
        cache: Arc<dyn KvCache>,
        model: impl Into<String>,
        dimension: usize,
        ttl_secs: u64,
    ) -> Self {
        Self {
            api,
            cache,
            model: model.into(),
            dimension,
            ttl_secs,
            retry: RetryConfig::default(),
        }
    }

    /// Resolve `text` to a vector of exactly `dimension` floats
    pub async fn resolve(&self, text: &str) -> Result<Vec<f32>> {
        let key = derive_key(text, &self.model);

        match self.lookup(&key).await {
            CacheLookup::Hit(vector) => {
                debug!("Embedding cache hit for {}", key);
                return Ok(vector);
            }
            CacheLookup::Corrupt => {
                warn!("Failed to parse cached embedding; will regenerate");
            }
            CacheLookup::Miss => {}
        }

        let vector = with_retries(&self.retry, || self.api.embed(text, &self.model)).await?;

        if vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                got: vector.len(),
                expected: self.dimension,
            });
        }

        self.store(&key, &vector).await;
        Ok(vector)
    }

    /// Probe the cache; lookup failures and unreadable payloads are a miss
    async fn lookup(&self, key: &str) -> CacheLookup {
        let payload = match self.cache.get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!("Cache read failed, treating as miss: {}", e);
                return CacheLookup::Miss;
            }
        };

        match serde_json::from_str::<Vec<f32>>(&payload) {
            Ok(vector) if vector.len() == self.dimension => CacheLookup::Hit(vector),
            Ok(_) => CacheLookup::Corrupt,
            Err(_) => CacheLookup::Corrupt,
        }
    }

    /// Best-effort cache write; a failure must not fail the resolve call
    async fn store(&self, key: &str, vector: &[f32]) {
        let payload = match serde_json::to_string(vector) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize embedding for cache: {}", e);
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &payload, self.ttl_secs).await {
            warn!("Cache write failed (ignored): {}", e);
        }
    }
}
