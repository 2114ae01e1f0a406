//! Dispatcher module
//!
//! Asks the model to pick one registered plugin for a goal, then invokes it.
//! Each call is independent: one chat request, one plugin invocation, no
//! retries.

use crate::error::{DispatchError, Result};
use crate::llm::LlmClient;
use crate::plugins::{Args, Plugin, PluginRegistry};
use crate::selection::{self, SelectionOutcome};
use std::sync::Arc;
use tracing::{debug, info};

/// A plugin resolved for a goal, together with the model's arguments
#[derive(Clone)]
pub struct PluginContext {
    pub plugin: Arc<dyn Plugin>,
    pub request: Args,
}

impl PluginContext {
    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    /// Invoke the plugin with the selected arguments
    pub async fn invoke(self) -> Result<Args> {
        let name = self.plugin.name().to_string();
        self.plugin
            .invoke(self.request)
            .await
            .map_err(|source| DispatchError::Capability {
                plugin: name,
                source,
            })
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("plugin", &self.plugin.name())
            .field("request", &self.request)
            .finish()
    }
}

/// Routes a goal to at most one plugin
pub struct Dispatcher {
    llm: Arc<dyn LlmClient>,
    registry: PluginRegistry,
}

impl Dispatcher {
    pub fn new(llm: Arc<dyn LlmClient>, registry: PluginRegistry) -> Self {
        Self { llm, registry }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Add a plugin; first registration under a name wins
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> bool {
        self.registry.register(plugin)
    }

    pub fn register_many<I>(&mut self, plugins: I)
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        self.registry.register_many(plugins)
    }

    /// The selection prompt that would be sent for `goal`
    pub fn prompt(&self, goal: &str) -> String {
        selection::compile(goal, self.registry.enumerate())
    }

    /// Select a plugin for `goal` and return its result
    pub async fn handle(&self, goal: &str) -> Result<Args> {
        self.handle_with(goal, |_| {}).await
    }

    /// Like `handle`, calling `on_select` after the plugin is resolved and
    /// before it is invoked
    pub async fn handle_with<F>(&self, goal: &str, on_select: F) -> Result<Args>
    where
        F: FnOnce(&PluginContext),
    {
        let context = self.select(goal).await?;
        on_select(&context);
        let plugin = context.name().to_string();

        let answer = context.invoke().await?;
        debug!("Got answer from plugin '{}': {:?}", plugin, answer);
        Ok(answer)
    }

    /// Ask the model which plugin fits `goal` and resolve it
    pub async fn select(&self, goal: &str) -> Result<PluginContext> {
        let answer = self.chat_with_llm(goal).await?;

        match selection::parse(&answer)? {
            SelectionOutcome::NoSelection => {
                debug!("Model declined to select a plugin");
                Err(DispatchError::NoValidPlugin { plugin: None })
            }
            SelectionOutcome::Selected { plugin, args } => match self.registry.lookup(&plugin) {
                Some(found) => {
                    info!("Selected plugin '{}'", found.name());
                    Ok(PluginContext {
                        plugin: found,
                        request: args,
                    })
                }
                None => {
                    debug!("Model selected unregistered plugin '{}'", plugin);
                    Err(DispatchError::NoValidPlugin {
                        plugin: Some(plugin),
                    })
                }
            },
        }
    }

    async fn chat_with_llm(&self, goal: &str) -> Result<String> {
        let messages = selection::conversation(goal, self.registry.enumerate());
        debug!(
            "Sending selection prompt ({} bytes, {} plugins)",
            messages[1].content.len(),
            self.registry.len()
        );

        let reply = self.llm.chat(&messages).await?;
        debug!("Model replied: {}", reply.content);
        Ok(reply.content)
    }
}
