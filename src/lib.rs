//! gptplugin - let a language model pick a plugin for a goal
//!
//! The [`Dispatcher`] advertises every registered [`Plugin`] to the model in
//! one prompt, parses the model's JSON reply into a selection, and invokes
//! the chosen plugin.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod llm;
pub mod logging;
pub mod plugins;
pub mod selection;

pub use dispatcher::{Dispatcher, PluginContext};
pub use error::{ConfigError, DispatchError, LlmError, PluginError};
pub use llm::{ChatMessage, LlmClient, OpenAiClient, Role};
pub use plugins::{Args, MatchPolicy, Plugin, PluginRegistry, SimplePlugin};
pub use selection::SelectionOutcome;
