//! Plugin registry
//!
//! Holds the plugins available to the dispatcher. Names are de-duplicated
//! after normalization; the first plugin registered under a name wins.

use super::Plugin;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// How `lookup` matches the name echoed by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// The echoed name must equal the registered name exactly
    #[default]
    Exact,
    /// Trimmed, case-insensitive match
    CaseInsensitive,
}

/// Registry key for a plugin name
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Registered plugins, in insertion order
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
    index: HashMap<String, usize>, // normalized name -> position
    policy: MatchPolicy,
}

impl PluginRegistry {
    /// Create an empty registry with exact lookup
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given lookup policy
    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Register a plugin; ignored if its normalized name is already taken.
    ///
    /// Returns whether the plugin was inserted.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> bool {
        let key = normalize(plugin.name());
        if self.index.contains_key(&key) {
            debug!(
                "Plugin '{}' already registered, keeping the first one",
                plugin.name()
            );
            return false;
        }

        debug!("Registered plugin '{}'", plugin.name());
        self.index.insert(key, self.plugins.len());
        self.plugins.push(plugin);
        true
    }

    /// Register each plugin in order
    pub fn register_many<I>(&mut self, plugins: I)
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        for plugin in plugins {
            self.register(plugin);
        }
    }

    /// Resolve the name returned by the model
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        let plugin = self
            .index
            .get(&normalize(name))
            .map(|&i| &self.plugins[i])?;

        match self.policy {
            MatchPolicy::Exact if plugin.name() != name => None,
            _ => Some(Arc::clone(plugin)),
        }
    }

    /// All plugins, in registration order
    pub fn enumerate(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins.iter()
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .field("policy", &self.policy)
            .finish()
    }
}
