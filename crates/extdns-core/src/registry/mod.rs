//! Plugin-based provider registry
//!
//! The registry lets registrar providers be registered at runtime and
//! selected by configuration, avoiding hardcoded if-else chains.
//!
//! ## Registration
//!
//! Provider crates register themselves during initialization:
//!
//! ```rust,ignore
//! // In extdns-provider-godaddy
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("godaddy", Box::new(GoDaddyFactory));
//! }
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{RegistryClient, RegistryClientFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Provider registry for configuration-driven client creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn RegistryClientFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a registry client factory under a provider type name
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn RegistryClientFactory>,
    ) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.insert(name.into(), factory);
    }

    /// Create a registry client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn RegistryClient>)`: Created client
    /// - `Err(Error::Config)`: If the provider type is not registered or creation fails
    pub fn create_client(&self, config: &ProviderConfig) -> Result<Arc<dyn RegistryClient>> {
        let provider_type = config.type_name();
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        providers.contains_key(name)
    }
}
