//! ============================================================================
//! OpenAI Client - Embeddings and chat completions over HTTP
//! ============================================================================
//! One shared client for both the embedding service and the generation
//! service; any OpenAI-compatible base URL works.
//! ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EmbeddingApi, GenerationApi};
use crate::error::{RagError, Result};
use crate::types::PromptMessage;

/// Client for an OpenAI-compatible API
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    model: String,
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct EmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiClient {
    /// Create a client against the given API base, e.g. "https://api.openai.com/v1"
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<String> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| RagError::Remote(format!("failed to send request to {path}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RagError::Remote(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&text) {
                return Err(RagError::Remote(format!(
                    "API error ({status}): {}",
                    parsed.error.message
                )));
            }
            return Err(RagError::Remote(format!("API error ({status}): {text}")));
        }

        Ok(text)
    }
}

#[async_trait]
impl EmbeddingApi for OpenAiClient {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        debug!("Requesting embedding for {} chars", text.len());

        let request = EmbeddingRequest {
            model: model.to_string(),
            input: vec![text.to_string()],
        };

        let body = self.post_json("/embeddings", &request).await?;
        let parsed: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| RagError::Remote(format!("failed to parse embedding response: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Embedding tokens used: {} (model: {})",
                usage.total_tokens, parsed.model
            );
        }

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::Remote("no embedding returned".into()))
    }
}

#[async_trait]
impl GenerationApi for OpenAiClient {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        model: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        debug!(
            "Requesting completion: {} messages, max_tokens {}",
            messages.len(),
            max_tokens
        );

        let request = ChatRequest {
            model,
            messages,
            temperature,
            max_tokens,
        };

        let body = self.post_json("/chat/completions", &request).await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| RagError::Remote(format!("failed to parse chat response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RagError::Remote("no completion choice returned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = OpenAiClient::new("key".into(), "https://api.openai.com/v1/".into());
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_chat_request_serialization() {
        use crate::types::Role;

        let messages = vec![PromptMessage::new(Role::User, "hello")];
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.2,
            max_tokens: 600,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 600);
    }

    #[test]
    fn test_error_body_parsing() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"rate_limit"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Rate limit reached");
    }
}
