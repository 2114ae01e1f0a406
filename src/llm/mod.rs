//! LLM client abstraction
//!
//! The dispatcher only needs one operation from a language model: send an
//! ordered list of role-tagged messages and get the reply text back.

mod openai;

pub use openai::OpenAiClient;

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

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

/// Chat-completion transport
///
/// Implementations own authentication, model choice and request timeouts.
/// Dropping the returned future must abandon the request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `messages` and return the model's reply
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::system("be helpful");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "be helpful"}));

        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_parse_assistant_message() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role": "assistant", "content": "{}"}"#).unwrap();
        assert_eq!(msg, ChatMessage::assistant("{}"));
    }
}
