//! OpenAI-compatible chat-completions client

use super::{ChatMessage, LlmClient, Result};
use crate::config::LlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Chat client speaking the OpenAI `/v1/chat/completions` format
pub struct OpenAiClient {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client, reading the API key from `config.api_key_env`
    pub fn new(config: LlmConfig) -> Result<Self> {
        let api_key = config.get_api_key().ok_or_else(|| {
            LlmError::Unavailable(format!("API key not found in {}", config.api_key_env))
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(config: LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| LlmError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }

    /// Model identifier sent with each request
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        debug!(
            "Sending request to {} with {} messages",
            self.config.endpoint,
            messages.len()
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::Parse("No content in response".to_string()))?;

        Ok(ChatMessage::assistant(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn test_config(endpoint: String) -> LlmConfig {
        LlmConfig {
            endpoint,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_chat_returns_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"{}"}}]}"#)
            .create_async()
            .await;

        let client = OpenAiClient::with_api_key(
            test_config(format!("{}/v1/chat/completions", server.url())),
            "sk-test",
        )
        .unwrap();

        let reply = client
            .chat(&[ChatMessage::system("sys"), ChatMessage::user("hi")])
            .await
            .unwrap();

        assert_eq!(reply, ChatMessage::assistant("{}"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = OpenAiClient::with_api_key(
            test_config(format!("{}/v1/chat/completions", server.url())),
            "sk-test",
        )
        .unwrap();

        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_missing_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = OpenAiClient::with_api_key(
            test_config(format!("{}/v1/chat/completions", server.url())),
            "sk-test",
        )
        .unwrap();

        let err = client.chat(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig {
            api_key_env: "GPTPLUGIN_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };

        match OpenAiClient::new(config) {
            Err(LlmError::Unavailable(msg)) => {
                assert!(msg.contains("GPTPLUGIN_TEST_KEY_THAT_IS_NEVER_SET"))
            }
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("client created without an API key"),
        }
    }
}
