//! # Injector Registry
//!
//! Injectors keyed by name, registered at startup and looked up when a
//! pipeline is configured. Uses DashMap so registration and lookup may
//! happen from any task.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Error;
use crate::error::Result;
use crate::injector::Injector;
use crate::pipeline::Pipeline;
use crate::retry::RetryInjector;

pub struct InjectorRegistry {
    injectors: DashMap<String, Arc<dyn Injector>>,
}

impl InjectorRegistry {
    pub fn new() -> Self {
        Self { injectors: DashMap::new() }
    }

    /// Creates a registry holding the built-in injectors (`retry`).
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(RetryInjector);
        registry
    }

    /// Registers an injector under its own name, replacing any previous one.
    pub fn register(&self, injector: impl Injector) {
        self.register_shared(Arc::new(injector));
    }

    pub fn register_shared(&self, injector: Arc<dyn Injector>) {
        let name = injector.name().to_string();
        tracing::debug!(injector = %name, "registered injector");
        self.injectors.insert(name, injector);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Injector>> {
        self.injectors.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.injectors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Assembles a pipeline running the named injectors in the given order.
    ///
    /// # Errors
    /// Returns `UnknownInjector` for the first name with no registration.
    pub fn pipeline<S: AsRef<str>>(&self, names: &[S]) -> Result<Pipeline> {
        let injectors = names.iter()
            .map(|n| self.get(n.as_ref()).ok_or_else(|| Error::UnknownInjector(n.as_ref().to_string())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Pipeline::new(injectors))
    }

    /// Like `pipeline`, from a comma-separated list such as `"app, retry"`.
    pub fn pipeline_from_config(&self, config: &str) -> Result<Pipeline> {
        let names: Vec<&str> = config.split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        self.pipeline(&names)
    }
}

impl Default for InjectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
