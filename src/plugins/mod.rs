//! Plugin system for gptplugin
//!
//! A plugin is a named capability the model can choose. The model only sees
//! its name, description and an example argument payload; the dispatcher
//! calls `invoke` with the arguments the model produced.

mod calculator;
mod hot_topics;
mod registry;
mod simple;

pub use calculator::Calculator;
pub use hot_topics::HotTopics;
pub use registry::{normalize, MatchPolicy, PluginRegistry};
pub use simple::SimplePlugin;

use crate::config::PluginConfig;
use crate::error::PluginError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Variant-valued mapping used for both plugin requests and results
pub type Args = serde_json::Map<String, serde_json::Value>;

/// Capability the model can select
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name advertised to the model and echoed back in its selection
    fn name(&self) -> &str;

    /// What the plugin does, shown to the model
    fn description(&self) -> &str;

    /// Literal example of the expected argument payload
    fn input_example(&self) -> &str;

    /// Run the plugin with the arguments chosen by the model
    async fn invoke(&self, args: Args) -> Result<Args, PluginError>;
}

/// Get a required string argument
pub fn require_string<'a>(args: &'a Args, name: &str) -> Result<&'a str, PluginError> {
    let value = args
        .get(name)
        .ok_or_else(|| PluginError::InvalidRequest(format!("Missing required parameter: {}", name)))?;

    value.as_str().ok_or_else(|| {
        PluginError::InvalidRequest(format!("Parameter '{}' must be a string, got {}", name, value))
    })
}

/// Build the built-in plugins enabled in `config`, in the configured order
pub fn builtin(config: &PluginConfig) -> Result<Vec<Arc<dyn Plugin>>, PluginError> {
    let mut plugins: Vec<Arc<dyn Plugin>> = Vec::new();

    for name in &config.enabled {
        match normalize(name).as_str() {
            "calculator" => plugins.push(Arc::new(Calculator::new())),
            "v2ex" => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(config.timeout))
                    .build()
                    .map_err(|e| {
                        PluginError::Execution(format!("Failed to create HTTP client: {}", e))
                    })?;
                plugins.push(Arc::new(HotTopics::new(client, &config.hot_topics_url)));
            }
            other => {
                return Err(PluginError::InvalidRequest(format!(
                    "Unknown built-in plugin: {}",
                    other
                )))
            }
        }
    }

    Ok(plugins)
}
