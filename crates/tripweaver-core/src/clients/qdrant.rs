//! ============================================================================
//! Qdrant Index - Vector similarity search
//! ============================================================================
//! Thin wrapper over the Qdrant client: existence-check-and-create for the
//! collection at startup, then read-only similarity search. Upserts belong
//! to the out-of-scope loader.
//! ============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, CreateCollectionBuilder, Distance, SearchPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use tracing::{debug, info, warn};

use super::{RawMatch, VectorIndex};
use crate::error::{RagError, Result};

/// Vector index backed by a Qdrant collection
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantIndex {
    /// Connect to Qdrant and ensure the collection exists
    pub async fn new(url: &str, collection: &str, vector_dim: usize) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| RagError::Config(format!("failed to create Qdrant client: {e}")))?;

        let index = Self {
            client,
            collection: collection.to_string(),
        };
        index.ensure_collection(vector_dim).await?;

        Ok(index)
    }

    /// Create the collection if it is not already there
    async fn ensure_collection(&self, vector_dim: usize) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| RagError::Remote(format!("failed to check collection existence: {e}")))?;

        if !exists {
            info!("Creating collection: {}", self.collection);

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(vector_dim as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| RagError::Remote(format!("failed to create collection: {e}")))?;

            info!("Collection {} created successfully", self.collection);
        } else {
            debug!("Collection {} already exists", self.collection);
        }

        Ok(())
    }

    /// Check whether Qdrant is reachable
    pub async fn health_check(&self) -> Result<bool> {
        match self.client.health_check().await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Qdrant health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn query(&self, vector: Vec<f32>, top_k: u64) -> Result<Vec<RawMatch>> {
        debug!("Searching {} for top {} neighbors", self.collection, top_k);

        let search_result = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true),
            )
            .await
            .map_err(|e| RagError::Remote(format!("vector search failed: {e}")))?;

        let matches = search_result
            .result
            .into_iter()
            .map(|point| {
                let id = point.id.and_then(point_id_string);
                let metadata = string_payload(&point.payload);
                RawMatch::Fields {
                    id,
                    score: Some(point.score),
                    metadata,
                }
            })
            .collect();

        Ok(matches)
    }
}

/// Extract the string form of a point id; numeric ids are not used here
fn point_id_string(point_id: qdrant_client::qdrant::PointId) -> Option<String> {
    match point_id.point_id_options? {
        PointIdOptions::Uuid(s) => Some(s),
        PointIdOptions::Num(n) => Some(n.to_string()),
    }
}

/// Keep the string-valued payload fields (name, type, city, description)
fn string_payload(payload: &HashMap<String, QdrantValue>) -> HashMap<String, String> {
    payload
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_payload_skips_non_strings() {
        let payload: HashMap<String, QdrantValue> = [
            ("name".to_string(), QdrantValue::from("Old Quarter")),
            ("visits".to_string(), QdrantValue::from(12_i64)),
        ]
        .into_iter()
        .collect();

        let extracted = string_payload(&payload);
        assert_eq!(extracted.get("name").map(String::as_str), Some("Old Quarter"));
        assert!(!extracted.contains_key("visits"));
    }

    // Integration tests require a running Qdrant instance

    #[tokio::test]
    #[ignore]
    async fn test_connect_and_query() {
        let index = QdrantIndex::new("http://localhost:6333", "tripweaver_test", 1536)
            .await
            .unwrap();
        assert!(index.health_check().await.unwrap());

        let matches = index.query(vec![0.1; 1536], 5).await.unwrap();
        assert!(matches.len() <= 5);
    }
}
