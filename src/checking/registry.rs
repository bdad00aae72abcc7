//! Explicit plugin registry, built once at startup.

use std::collections::HashMap;
use thiserror::Error;

use super::CheckPlugin;

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("check plugin {0} is already registered")]
    Duplicate(String),
}

/// All check plugins known to the engine, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    plugins: HashMap<String, CheckPlugin>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the plugins shipped with the engine.
    pub fn with_builtin_plugins() -> Self {
        let mut registry = Self::new();
        for plugin in crate::plugins::builtin_plugins() {
            // builtin names are distinct
            let _ = registry.register(plugin);
        }
        registry
    }

    pub fn register(&mut self, plugin: CheckPlugin) -> Result<(), RegistryError> {
        if self.plugins.contains_key(plugin.name()) {
            return Err(RegistryError::Duplicate(plugin.name().to_string()));
        }
        self.plugins.insert(plugin.name().to_string(), plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CheckPlugin> {
        self.plugins.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
