//! Provider registry
//!
//! Maps a backend variant tag to a client constructor. Built once at
//! startup and resolved per descriptor, replacing any notion of scanning
//! for implementations at call time.

use crate::client::{ProviderClient, ProviderKind};
use crate::memory::MemoryProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use stratus_core::chunk::ProviderId;
use stratus_core::error::{Result, StratusError};
use tracing::debug;
use uuid::Uuid;

/// Stored description of one authorized provider account
///
/// The engine receives these externally (the user's set of authorized
/// clouds) and never performs authorization itself. `settings` carries
/// adapter-specific configuration such as endpoints or token handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: Uuid,
    pub kind: ProviderKind,
    pub name: String,

    #[serde(default)]
    pub settings: serde_json::Value,
}

impl ProviderDescriptor {
    pub fn new(kind: ProviderKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            settings: serde_json::Value::Null,
        }
    }

    pub fn provider_id(&self) -> ProviderId {
        ProviderId::from_uuid(self.id)
    }
}

/// Constructor for one backend variant
pub type ProviderFactory =
    Box<dyn Fn(&ProviderDescriptor) -> Result<Arc<dyn ProviderClient>> + Send + Sync>;

/// Registry of provider constructors, keyed by variant tag
pub struct ProviderRegistry {
    factories: HashMap<ProviderKind, ProviderFactory>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in backends registered
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(
            ProviderKind::Memory,
            Box::new(|descriptor| {
                Ok(Arc::new(MemoryProvider::with_id(
                    descriptor.provider_id(),
                    descriptor.name.clone(),
                )) as Arc<dyn ProviderClient>)
            }),
        );
        registry
    }

    /// Register (or replace) the constructor for a variant
    pub fn register(&mut self, kind: ProviderKind, factory: ProviderFactory) {
        self.factories.insert(kind, factory);
    }

    /// True if a constructor is registered for `kind`
    pub fn supports(&self, kind: ProviderKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Construct a client for one descriptor
    pub fn build(&self, descriptor: &ProviderDescriptor) -> Result<Arc<dyn ProviderClient>> {
        let factory = self.factories.get(&descriptor.kind).ok_or_else(|| {
            StratusError::Configuration(format!(
                "no provider registered for kind '{}'",
                descriptor.kind
            ))
        })?;
        let client = factory(descriptor)?;
        debug!(kind = %descriptor.kind, name = %descriptor.name, "Provider client built");
        Ok(client)
    }

    /// Construct the full pool for a user's descriptors
    pub fn build_pool(
        &self,
        descriptors: &[ProviderDescriptor],
    ) -> Result<Vec<Arc<dyn ProviderClient>>> {
        descriptors.iter().map(|d| self.build(d)).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_memory_factory() {
        let registry = ProviderRegistry::new();
        assert!(registry.supports(ProviderKind::Memory));

        let descriptor = ProviderDescriptor::new(ProviderKind::Memory, "mem-1");
        let client = registry.build(&descriptor).unwrap();
        assert_eq!(client.kind(), ProviderKind::Memory);
        assert_eq!(client.name(), "mem-1");
        // The client answers for the descriptor's identity
        assert_eq!(client.id(), descriptor.provider_id());
    }

    #[test]
    fn test_unregistered_kind_is_configuration_error() {
        let registry = ProviderRegistry::new();
        let descriptor = ProviderDescriptor::new(ProviderKind::Dropbox, "db-1");

        let result = registry.build(&descriptor);
        assert!(matches!(result, Err(StratusError::Configuration(_))));
    }

    #[test]
    fn test_build_pool() {
        let registry = ProviderRegistry::new();
        let descriptors = vec![
            ProviderDescriptor::new(ProviderKind::Memory, "mem-1"),
            ProviderDescriptor::new(ProviderKind::Memory, "mem-2"),
        ];

        let pool = registry.build_pool(&descriptors).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_descriptor_serde() {
        let descriptor = ProviderDescriptor::new(ProviderKind::Box, "box-1");
        let json = serde_json::to_string(&descriptor).unwrap();
        let back: ProviderDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, ProviderKind::Box);
        assert_eq!(back.name, "box-1");
    }
}
