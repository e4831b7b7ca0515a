//! Chat Completion Wire Types
//!
//! Request and response bodies exchanged with the upstream
//! `/chat/completions` endpoint.

use serde::{Deserialize, Serialize};

/// A message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role: "system", "user" or "assistant"; some providers omit it on replies
    #[serde(default)]
    pub role: String,

    /// Message content (string, array of content parts, or absent)
    #[serde(default)]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(MessageContent::Text(content.into())),
        }
    }
}

/// Message content - can be a simple string or array of parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple string content
    Text(String),

    /// Array of content parts
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Text of the content, concatenating text parts.
    ///
    /// Returns `None` for a parts array with no text part.
    pub fn text(&self) -> Option<String> {
        match self {
            MessageContent::Text(s) => Some(s.clone()),
            MessageContent::Parts(parts) => {
                let texts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
                if texts.is_empty() {
                    None
                } else {
                    Some(texts.concat())
                }
            }
        }
    }
}

/// A content part; only text parts contribute to the completion string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Upstream model identifier
    pub model: String,

    /// Messages in the conversation
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// Single-turn request carrying one user message
    pub fn single_turn(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(message)],
        }
    }
}

/// Chat completion response.
///
/// Only the fields the router relies on are typed; `usage` is kept opaque
/// and handed back to the caller verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    /// Response choices
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage as the provider reported it
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

/// A choice in the completion response
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The message
    pub message: Message,
}

impl CompletionResponse {
    /// Get the first choice's content, if the provider returned one
    pub fn content(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .and_then(MessageContent::text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_turn_request_serialization() {
        let request = CompletionRequest::single_turn("openai/gpt-4o-mini", "Hello");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "openai/gpt-4o-mini",
                "messages": [{ "role": "user", "content": "Hello" }]
            })
        );
    }

    #[test]
    fn test_completion_response_deserialization() {
        let json = r#"{
            "id": "gen-123",
            "object": "chat.completion",
            "created": 1677652288,
            "model": "openai/gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello!"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 5,
                "total_tokens": 15
            }
        }"#;

        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content(), Some("Hello!".to_string()));
        assert_eq!(response.usage.unwrap()["total_tokens"], 15);
    }

    #[test]
    fn test_content_parts_are_joined() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": [
                        { "type": "text", "text": "Hello " },
                        { "type": "image_url" },
                        { "type": "text", "text": "World" }
                    ]
                }
            }]
        }"#;

        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content(), Some("Hello World".to_string()));
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_reply_without_role() {
        let response: CompletionResponse =
            serde_json::from_str(r#"{ "choices": [{ "message": { "content": "pong" } }] }"#).unwrap();
        assert_eq!(response.content(), Some("pong".to_string()));
    }

    #[test]
    fn test_parts_without_text_have_no_content() {
        let response: CompletionResponse = serde_json::from_str(
            r#"{ "choices": [{ "message": { "role": "assistant", "content": [{ "type": "image_url" }] } }] }"#,
        )
        .unwrap();
        assert_eq!(response.content(), None);

        let response: CompletionResponse = serde_json::from_str(
            r#"{ "choices": [{ "message": { "role": "assistant", "content": [] } }] }"#,
        )
        .unwrap();
        assert_eq!(response.content(), None);
    }

    #[test]
    fn test_missing_choices_has_no_content() {
        let response: CompletionResponse =
            serde_json::from_str(r#"{ "error": { "message": "busy" } }"#).unwrap();
        assert!(response.choices.is_empty());
        assert_eq!(response.content(), None);

        let response: CompletionResponse = serde_json::from_str(
            r#"{ "choices": [{ "message": { "role": "assistant", "content": null } }] }"#,
        )
        .unwrap();
        assert_eq!(response.content(), None);
    }
}
