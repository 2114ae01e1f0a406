//! Error types for gptplugin

use thiserror::Error;

/// Failure of a single `select` / `handle` call
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to decode plugin selection: {0}")]
    Decode(String),

    #[error("No valid plugin{}", named(.plugin))]
    NoValidPlugin { plugin: Option<String> },

    #[error("Chat with llm failed: {0}")]
    Transport(#[from] LlmError),

    #[error("Plugin '{plugin}' failed: {source}")]
    Capability {
        plugin: String,
        #[source]
        source: PluginError,
    },
}

fn named(plugin: &Option<String>) -> String {
    plugin
        .as_deref()
        .map(|p| format!(": {}", p))
        .unwrap_or_default()
}

impl DispatchError {
    /// True when the model declined to choose or named an unknown plugin
    pub fn is_no_valid_plugin(&self) -> bool {
        matches!(self, DispatchError::NoValidPlugin { .. })
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// LLM transport errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse LLM response: {0}")]
    Parse(String),

    #[error("LLM request timeout")]
    Timeout,

    #[error("LLM unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by a plugin's invoke operation
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Invalid plugin request: {0}")]
    InvalidRequest(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Result type alias using DispatchError
pub type Result<T> = std::result::Result<T, DispatchError>;
