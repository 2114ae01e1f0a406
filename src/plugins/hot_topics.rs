//! v2ex hot topics plugin
//!
//! Fetches the current hot topic list over HTTP. The HTTP client is
//! injected so callers control timeouts and connection pooling.

use super::{Args, Plugin};
use crate::error::PluginError;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

const NAME: &str = "v2ex";
const DESCRIPTION: &str = "v2ex is a community of designers, programmers and creative people. \
This tool returns the current list of hot topics on v2ex.";
const INPUT_EXAMPLE: &str = "{}";

/// Hot topics fetcher
#[derive(Debug, Clone)]
pub struct HotTopics {
    client: reqwest::Client,
    url: String,
}

impl HotTopics {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    async fn fetch(&self) -> Result<Vec<Value>, PluginError> {
        debug!("Fetching hot topics from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PluginError::Network(format!("send http request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PluginError::Network(format!(
                "hot topics request returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PluginError::Network(format!("read http response failed: {}", e)))?;

        serde_json::from_str::<Vec<Value>>(&body)
            .map_err(|e| PluginError::Decode(format!("failed decode http response: {}", e)))
    }
}

#[async_trait]
impl Plugin for HotTopics {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn input_example(&self) -> &str {
        INPUT_EXAMPLE
    }

    async fn invoke(&self, _args: Args) -> Result<Args, PluginError> {
        let topics = self.fetch().await?;

        let mut result = Args::new();
        result.insert("result".to_string(), json!(true));
        result.insert("data".to_string(), Value::Array(topics));
        Ok(result)
    }
}
