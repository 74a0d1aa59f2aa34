//! ============================================================================
//! Neo4j Graph Client - Read queries over the HTTP transaction endpoint
//! ============================================================================
//! POSTs Cypher to `/db/{database}/tx/commit` and flattens the row-oriented
//! response into column-keyed JSON objects. Only read queries are issued by
//! the pipeline; graph loading lives in out-of-scope scripts.
//! ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::GraphStore;
use crate::error::{RagError, Result};

/// Graph store backed by the Neo4j HTTP API
pub struct Neo4jHttpGraph {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Value,
}

#[derive(Deserialize)]
struct TxResponse {
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl Neo4jHttpGraph {
    /// Create a client for `base_url` (e.g. "http://localhost:7474")
    pub fn new(base_url: &str, database: &str, username: String, password: String) -> Self {
        let endpoint = format!(
            "{}/db/{}/tx/commit",
            base_url.trim_end_matches('/'),
            database
        );
        Self {
            client: Client::new(),
            endpoint,
            username,
            password,
        }
    }

    /// Zip each row with the result's column names
    fn rows_from_response(response: TxResponse) -> Result<Vec<Value>> {
        if let Some(err) = response.errors.first() {
            return Err(RagError::Remote(format!(
                "Neo4j error {}: {}",
                err.code, err.message
            )));
        }

        let mut rows = Vec::new();
        for result in response.results {
            for data in result.data {
                let mut object = Map::new();
                for (column, value) in result.columns.iter().zip(data.row) {
                    object.insert(column.clone(), value);
                }
                rows.push(Value::Object(object));
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl GraphStore for Neo4jHttpGraph {
    async fn run_read_query(&self, query: &str, params: Value) -> Result<Vec<Value>> {
        debug!("Running graph read query against {}", self.endpoint);

        let request = TxRequest {
            statements: vec![Statement {
                statement: query,
                parameters: &params,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Remote(format!("failed to reach Neo4j: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RagError::Remote(format!("failed to read Neo4j response: {e}")))?;

        if !status.is_success() {
            return Err(RagError::Remote(format!("Neo4j HTTP error ({status}): {body}")));
        }

        let parsed: TxResponse = serde_json::from_str(&body)
            .map_err(|e| RagError::Remote(format!("failed to parse Neo4j response: {e}")))?;

        let rows = Self::rows_from_response(parsed)?;
        debug!("Graph query returned {} rows", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_zip_columns() {
        let response: TxResponse = serde_json::from_value(json!({
            "results": [{
                "columns": ["source_id", "rel", "target_id"],
                "data": [
                    {"row": ["A1", "NEAR", "A2"]},
                    {"row": ["A1", "IN_CITY", "C7"]}
                ]
            }],
            "errors": []
        }))
        .unwrap();

        let rows = Neo4jHttpGraph::rows_from_response(response).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["source_id"], "A1");
        assert_eq!(rows[1]["rel"], "IN_CITY");
    }

    #[test]
    fn test_reported_errors_surface() {
        let response: TxResponse = serde_json::from_value(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "bad query"}]
        }))
        .unwrap();

        let err = Neo4jHttpGraph::rows_from_response(response).unwrap_err();
        assert!(matches!(err, RagError::Remote(_)));
        assert!(err.to_string().contains("SyntaxError"));
    }

    #[test]
    fn test_endpoint_construction() {
        let graph = Neo4jHttpGraph::new("http://localhost:7474/", "neo4j", "u".into(), "p".into());
        assert_eq!(graph.endpoint, "http://localhost:7474/db/neo4j/tx/commit");
    }
}
