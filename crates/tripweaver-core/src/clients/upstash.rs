//! ============================================================================
//! Upstash Redis Cache - Best-effort key-value store over REST
//! ============================================================================
//! GET /get/{key} and POST /set/{key}?EX={ttl} with bearer-token auth.
//! The cache is never authoritative: callers treat every failure here as a
//! miss or a skipped write, not a request failure.
//! ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::KvCache;
use crate::error::{RagError, Result};

/// Key-value cache backed by the Upstash Redis REST API
pub struct UpstashRedisCache {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct RestResponse {
    result: Option<Value>,
}

impl UpstashRedisCache {
    pub fn new(base_url: &str, token: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn parse(&self, response: reqwest::Response) -> Result<RestResponse> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RagError::Remote(format!("failed to read cache response: {e}")))?;

        if !status.is_success() {
            return Err(RagError::Remote(format!("cache error ({status}): {body}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| RagError::Remote(format!("failed to parse cache response: {e}")))
    }
}

#[async_trait]
impl KvCache for UpstashRedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!("Cache GET {}", key);

        let response = self
            .client
            .get(format!("{}/get/{}", self.base_url, key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| RagError::Remote(format!("cache get failed: {e}")))?;

        let parsed = self.parse(response).await?;
        Ok(match parsed.result {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        debug!("Cache SET {} (ttl {}s)", key, ttl_secs);

        let response = self
            .client
            .post(format!("{}/set/{}?EX={}", self.base_url, key, ttl_secs))
            .bearer_auth(&self.token)
            .body(value.to_string())
            .send()
            .await
            .map_err(|e| RagError::Remote(format!("cache set failed: {e}")))?;

        self.parse(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let cache = UpstashRedisCache::new("https://example.upstash.io/", "token".into());
        assert_eq!(cache.base_url, "https://example.upstash.io");
    }

    #[test]
    fn test_null_result_is_miss() {
        let parsed: RestResponse = serde_json::from_str(r#"{"result":null}"#).unwrap();
        assert!(parsed.result.unwrap_or(Value::Null).is_null());
    }
}
