//! ============================================================================
//! Core Types - Retrieval records, conversation turns, prompt messages
//! ============================================================================
//! These types cross every stage boundary of the pipeline and are serialized
//! to JSON at the front-end edge.
//! ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One normalized hit from the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMatch {
    /// Entity id in the index and the knowledge graph
    pub id: String,
    /// Similarity score, higher is more relevant
    pub score: f32,
    /// String payload fields: name, type, city, description
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RetrievalMatch {
    /// Metadata field lookup with empty-string fallback
    pub fn meta(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("")
    }
}

/// One one-hop relation from the knowledge graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFact {
    pub source_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_name: String,
    pub rel: String,
    pub target_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_desc: String,
}

/// Graph nodes may have no name/description property; those come back as
/// JSON null rather than an absent field.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One prior turn of the conversation, owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One message of a generation request, never mutated after assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for PromptMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// Result of one full pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOutcome {
    /// User-facing answer text
    pub answer: String,
    /// Ids of the vector matches the answer was grounded on
    pub source_ids: Vec<String>,
    /// Conversation id, generated when the caller supplied none
    pub conversation_id: String,
    /// Windowed history including the turn just completed
    pub updated_history: Vec<ConversationTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_turn_to_prompt_message() {
        let turn = ConversationTurn::user("hello");
        let msg = PromptMessage::from(&turn);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_graph_fact_null_properties() {
        let fact: GraphFact = serde_json::from_value(serde_json::json!({
            "source_id": "A1", "source_name": null, "rel": "NEAR",
            "target_id": "A2", "target_name": "Hoan Kiem Lake", "target_desc": null
        }))
        .unwrap();
        assert_eq!(fact.source_name, "");
        assert_eq!(fact.target_name, "Hoan Kiem Lake");
        assert_eq!(fact.target_desc, "");
    }

    #[test]
    fn test_metadata_fallback() {
        let m = RetrievalMatch {
            id: "A1".into(),
            score: 0.9,
            metadata: HashMap::from([("name".to_string(), "Old Quarter".to_string())]),
        };
        assert_eq!(m.meta("name"), "Old Quarter");
        assert_eq!(m.meta("city"), "");
    }
}
