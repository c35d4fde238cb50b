//! Career mentor chat (`/chat`)

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use serde_json::Value;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default, deserialize_with = "crate::api::null_as_default")]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One line of a conversation transcript, as kept by callers.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.to_string(),
            timestamp: None,
        }
    }
}

impl From<ChatResponse> for ChatMessage {
    fn from(resp: ChatResponse) -> Self {
        ChatMessage {
            role: "assistant".to_string(),
            content: resp.message,
            timestamp: resp.timestamp,
        }
    }
}

impl ApiClient {
    pub async fn send_chat_message(&self, message: &str) -> Result<ChatResponse, ApiError> {
        let body = ChatRequest {
            message: message.to_string(),
            context: None,
        };
        self.request(&ApiRequest::post("/chat").json(&body)?).await
    }
}

#[test]
fn test_chat_response_to_transcript() {
    let resp: ChatResponse = serde_json::from_value(serde_json::json!({
        "message": "Focus on SQL next.",
        "suggestions": ["Show my roadmap"]
    }))
    .unwrap();
    assert_eq!(resp.timestamp, None);
    let msg = ChatMessage::from(resp);
    assert_eq!(msg.role, "assistant");
    assert_eq!(msg.content, "Focus on SQL next.");
    assert_eq!(ChatMessage::user("hi").role, "user");
}

#[test]
fn test_chat_response_null_suggestions() {
    let resp: ChatResponse = serde_json::from_value(serde_json::json!({
        "message": "hi",
        "suggestions": null,
        "timestamp": "2024-03-01T10:00:00"
    }))
    .unwrap();
    assert!(resp.suggestions.is_empty());
    assert_eq!(resp.timestamp.as_deref(), Some("2024-03-01T10:00:00"));

    let resp: ChatResponse =
        serde_json::from_value(serde_json::json!({"message": "hi"})).unwrap();
    assert!(resp.suggestions.is_empty());
}
