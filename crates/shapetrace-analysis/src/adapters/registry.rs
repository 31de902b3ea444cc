//! Adapter registry keyed by kind.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use shapetrace_core::errors::RegistryError;

use crate::schema::SchemaRef;

use super::SchemaAdapter;

const REGISTRY: &str = "adapter";

/// Adapters in registration order. A kind registered twice replaces the first.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SchemaAdapter>>,
    index: FxHashMap<String, usize>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// MCP and SQL adapters with default settings.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(Arc::new(super::McpToolAdapter::new()));
        registry.insert(Arc::new(super::SqlDdlAdapter::new()));
        registry
    }

    pub fn register<A: SchemaAdapter + 'static>(&mut self, adapter: A) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(adapter))
    }

    pub fn register_arc(&mut self, adapter: Arc<dyn SchemaAdapter>) -> Result<(), RegistryError> {
        if adapter.kind().is_empty() {
            return Err(RegistryError::Validation {
                registry: REGISTRY,
                missing: vec!["kind"],
                entry: "{ kind: \"\" }".to_string(),
            });
        }
        self.insert(adapter);
        Ok(())
    }

    /// Place an adapter whose kind is already validated.
    fn insert(&mut self, adapter: Arc<dyn SchemaAdapter>) {
        let kind = adapter.kind().to_string();
        match self.index.get(&kind).copied() {
            Some(slot) => {
                tracing::warn!(adapter = %kind, "adapter overwritten");
                self.adapters[slot] = adapter;
            }
            None => {
                self.index.insert(kind, self.adapters.len());
                self.adapters.push(adapter);
            }
        }
    }

    pub fn get(&self, kind: &str) -> Result<Arc<dyn SchemaAdapter>, RegistryError> {
        self.index
            .get(kind)
            .map(|&slot| Arc::clone(&self.adapters[slot]))
            .ok_or_else(|| self.not_found(kind))
    }

    /// First adapter, in registration order, that supports `schema_ref`.
    pub fn for_ref(&self, schema_ref: &SchemaRef) -> Result<Arc<dyn SchemaAdapter>, RegistryError> {
        self.adapters
            .iter()
            .find(|a| a.supports(schema_ref))
            .cloned()
            .ok_or_else(|| self.not_found(&schema_ref.source))
    }

    pub fn kinds(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.kind().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    fn not_found(&self, requested: &str) -> RegistryError {
        RegistryError::NotFound {
            registry: REGISTRY,
            requested: requested.to_string(),
            available: self.kinds(),
        }
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
