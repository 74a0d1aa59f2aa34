//! ============================================================================
//! Hybrid Retriever - Vector similarity plus one-hop graph expansion
//! ============================================================================
//! The vector leg resolves the query embedding and asks the index for the
//! top-K neighbors; the graph leg expands one hop out from every matched id
//! in a single batched read query. The legs run sequentially because the
//! graph leg consumes the vector leg's ids.
//!
//! Raw index hits are normalized through one conversion function per known
//! shape; a record that fits no shape is dropped with a warning, never
//! fatal for the request.
//! ============================================================================

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::embedding::EmbeddingResolver;
use crate::clients::{GraphStore, RawMatch, VectorIndex};
use crate::config::MAX_GRAPH_FACTS;
use crate::error::{RagError, Result};
use crate::retry::{with_retries, RetryConfig};
use crate::text::truncate;
use crate::types::{GraphFact, RetrievalMatch};

/// Longest target description kept on a graph fact
const TARGET_DESC_MAX: usize = 400;

/// Batched one-hop expansion across all matched ids, duplicates collapsed
const ONE_HOP_QUERY: &str = "UNWIND $node_ids AS nid \
     MATCH (n:Entity {id:nid})-[r]-(m:Entity) \
     WITH DISTINCT n, r, m \
     RETURN n.id AS source_id, n.name AS source_name, type(r) AS rel, \
     m.id AS target_id, m.name AS target_name, m.description AS target_desc \
     LIMIT 200";

/// Combines the vector and graph legs into one candidate/fact set
pub struct HybridRetriever {
    resolver: EmbeddingResolver,
    index: Arc<dyn VectorIndex>,
    graph: Arc<dyn GraphStore>,
    retry: RetryConfig,
}

impl HybridRetriever {
    pub fn new(
        resolver: EmbeddingResolver,
        index: Arc<dyn VectorIndex>,
        graph: Arc<dyn GraphStore>,
    ) -> Self {
        Self {
            resolver,
            index,
            graph,
            retry: RetryConfig::default(),
        }
    }

    /// Run both legs for `query`, returning matches and neighbor facts.
    /// Order within each list is preserved from the underlying service.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: u64,
    ) -> Result<(Vec<RetrievalMatch>, Vec<GraphFact>)> {
        let matches = self.vector_leg(query, top_k).await?;

        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        let facts = self.graph_leg(&ids).await?;

        Ok((matches, facts))
    }

    async fn vector_leg(&self, query: &str, top_k: u64) -> Result<Vec<RetrievalMatch>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.resolver.resolve(query).await?;

        let raw = with_retries(&self.retry, || self.index.query(vector.clone(), top_k)).await?;
        debug!("Vector search returned {} raw matches", raw.len());

        let matches: Vec<RetrievalMatch> = raw
            .into_iter()
            .filter_map(|record| match normalize_match(record) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!("Dropping unnormalizable match: {}", e);
                    None
                }
            })
            .collect();

        Ok(matches)
    }

    /// One batched expansion query; an empty id set issues no call at all
    async fn graph_leg(&self, node_ids: &[&str]) -> Result<Vec<GraphFact>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = json!({ "node_ids": node_ids });
        let rows = self.graph.run_read_query(ONE_HOP_QUERY, params).await?;

        let facts: Vec<GraphFact> = rows
            .into_iter()
            .filter_map(|row| match fact_from_row(row) {
                Ok(fact) => Some(fact),
                Err(e) => {
                    warn!("Dropping unnormalizable graph row: {}", e);
                    None
                }
            })
            .take(MAX_GRAPH_FACTS)
            .collect();

        debug!("Graph expansion returned {} facts", facts.len());
        Ok(facts)
    }
}

/// Convert a field-wise or mapping-style raw hit into the canonical record
pub fn normalize_match(raw: RawMatch) -> Result<RetrievalMatch> {
    match raw {
        RawMatch::Fields { id, score, metadata } => {
            let id = id.ok_or_else(|| RagError::Normalization("match without id".into()))?;
            Ok(RetrievalMatch {
                id,
                score: score.unwrap_or(0.0),
                metadata,
            })
        }
        RawMatch::Object(value) => match_from_object(value),
    }
}

/// Mapping-style shape: {"id": ..., "score": ..., "metadata": {...}}
fn match_from_object(value: Value) -> Result<RetrievalMatch> {
    let object = value
        .as_object()
        .ok_or_else(|| RagError::Normalization("match is not an object".into()))?;

    let id = object
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| RagError::Normalization("match without id".into()))?
        .to_string();

    let score = object
        .get("score")
        .and_then(Value::as_f64)
        .unwrap_or(0.0) as f32;

    let metadata = object
        .get("metadata")
        .and_then(Value::as_object)
        .map(|meta| {
            meta.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(RetrievalMatch { id, score, metadata })
}

/// A graph row missing its key columns is dropped, not fatal
fn fact_from_row(row: Value) -> Result<GraphFact> {
    let mut fact: GraphFact = serde_json::from_value(row)
        .map_err(|e| RagError::Normalization(format!("graph row: {e}")))?;
    fact.target_desc = truncate(&fact.target_desc, TARGET_DESC_MAX);
    Ok(fact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{EmbeddingApi, KvCache};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubEmbeddingApi;

    #[async_trait]
    impl EmbeddingApi for StubEmbeddingApi {
        async fn embed(&self, _text: &str, _model: &str) -> Result<Vec<f32>> {
            Ok(vec![0.1; 4])
        }
    }

    struct NoopCache;

    #[async_trait]
    impl KvCache for NoopCache {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<()> {
            Ok(())
        }
    }

    struct FakeIndex {
        raw: Vec<RawMatch>,
    }

    #[async_trait]
    impl VectorIndex for FakeIndex {
        async fn query(&self, _vector: Vec<f32>, _top_k: u64) -> Result<Vec<RawMatch>> {
            Ok(self.raw.clone())
        }
    }

    struct FakeGraph {
        rows: Vec<Value>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl GraphStore for FakeGraph {
        async fn run_read_query(&self, _query: &str, _params: Value) -> Result<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    fn retriever(raw: Vec<RawMatch>, graph: Arc<FakeGraph>) -> HybridRetriever {
        let resolver = EmbeddingResolver::new(
            Arc::new(StubEmbeddingApi),
            Arc::new(NoopCache),
            "test-model",
            4,
            60,
        );
        HybridRetriever::new(resolver, Arc::new(FakeIndex { raw }), graph)
    }

    fn fields_match(id: &str, score: f32, name: &str) -> RawMatch {
        RawMatch::Fields {
            id: Some(id.to_string()),
            score: Some(score),
            metadata: HashMap::from([("name".to_string(), name.to_string())]),
        }
    }

    #[tokio::test]
    async fn test_zero_top_k_issues_no_calls() {
        let graph = Arc::new(FakeGraph {
            rows: vec![],
            calls: AtomicU32::new(0),
        });
        let retriever = retriever(vec![fields_match("A1", 0.9, "Old Quarter")], graph.clone());

        let (matches, facts) = retriever.retrieve("anything", 0).await.unwrap();
        assert!(matches.is_empty());
        assert!(facts.is_empty());
        assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_match_set_skips_graph_query() {
        let graph = Arc::new(FakeGraph {
            rows: vec![json!({"source_id": "A1", "rel": "NEAR", "target_id": "A2"})],
            calls: AtomicU32::new(0),
        });
        let retriever = retriever(vec![], graph.clone());

        let (matches, facts) = retriever.retrieve("no matches", 5).await.unwrap();
        assert!(matches.is_empty());
        assert!(facts.is_empty());
        assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unnormalizable_matches_dropped_not_fatal() {
        let graph = Arc::new(FakeGraph {
            rows: vec![],
            calls: AtomicU32::new(0),
        });
        let raw = vec![
            fields_match("A1", 0.9, "Old Quarter"),
            RawMatch::Fields {
                id: None,
                score: Some(0.7),
                metadata: HashMap::new(),
            },
            RawMatch::Object(json!("just a string")),
            RawMatch::Object(json!({"id": "A3", "score": 0.5, "metadata": {"name": "Citadel"}})),
        ];
        let retriever = retriever(raw, graph);

        let (matches, _) = retriever.retrieve("Hanoi", 5).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A3"]);
    }

    #[tokio::test]
    async fn test_graph_rows_parsed_and_truncated() {
        let graph = Arc::new(FakeGraph {
            rows: vec![
                json!({
                    "source_id": "A1", "source_name": "Old Quarter", "rel": "NEAR",
                    "target_id": "A2", "target_name": "Hoan Kiem Lake",
                    "target_desc": "x".repeat(600)
                }),
                // Missing target_id: dropped
                json!({"source_id": "A1", "rel": "NEAR"}),
            ],
            calls: AtomicU32::new(0),
        });
        let retriever = retriever(vec![fields_match("A1", 0.9, "Old Quarter")], graph);

        let (_, facts) = retriever.retrieve("Hanoi", 5).await.unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].target_id, "A2");
        assert_eq!(facts[0].target_desc.chars().count(), TARGET_DESC_MAX);
    }

    #[test]
    fn test_object_shape_normalization() {
        let m = normalize_match(RawMatch::Object(json!({
            "id": "A1", "score": 0.9,
            "metadata": {"name": "Old Quarter", "rank": 3}
        })))
        .unwrap();
        assert_eq!(m.id, "A1");
        assert!((m.score - 0.9).abs() < 1e-6);
        assert_eq!(m.meta("name"), "Old Quarter");
        // Non-string metadata values are not locality tags, skip them
        assert_eq!(m.meta("rank"), "");
    }

    #[test]
    fn test_one_hop_query_is_batched_and_capped() {
        assert!(ONE_HOP_QUERY.contains("UNWIND $node_ids"));
        assert!(ONE_HOP_QUERY.contains("WITH DISTINCT"));
        assert!(ONE_HOP_QUERY.contains("LIMIT 200"));
    }
}
