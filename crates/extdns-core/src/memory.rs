// # Memory Registry Client
//
// In-memory implementation of RegistryClient.
//
// ## Purpose
//
// Holds per-domain record lists in a HashMap behind a RwLock and applies
// replacements atomically, the same way the registrar does. Useful for
// embedding, local experiments and tests.
//
// ## Behavior
//
// - Unknown domains fetch as an empty list
// - `replace_all` swaps the whole list in one write
// - All state is lost on drop

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::record::RegistrarRecord;
use crate::traits::RegistryClient;
use crate::Error;

/// In-memory registry client implementation
///
/// Clones share the same storage.
///
/// # Example
///
/// ```rust,no_run
/// use extdns_core::memory::MemoryRegistryClient;
/// use extdns_core::{RegistrarRecord, RegistryClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = MemoryRegistryClient::new();
///     client
///         .replace_all("example.com", &[RegistrarRecord::new("www", "A", "1.2.3.4", 600)])
///         .await?;
///
///     assert_eq!(client.fetch_all("example.com").await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistryClient {
    inner: Arc<RwLock<HashMap<String, Vec<RegistrarRecord>>>>,
}

impl MemoryRegistryClient {
    /// Create a new empty client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client pre-populated with domain record lists
    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<RegistrarRecord>)>,
        S: Into<String>,
    {
        let map = domains
            .into_iter()
            .map(|(domain, records)| (domain.into(), records))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Snapshot of a domain's records, `None` if it was never written
    pub async fn records(&self, domain: &str) -> Option<Vec<RegistrarRecord>> {
        self.inner.read().await.get(domain).cloned()
    }

    /// Number of domains held
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistryClient {
    async fn fetch_all(&self, domain: &str) -> Result<Vec<RegistrarRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(domain).cloned().unwrap_or_default())
    }

    async fn replace_all(&self, domain: &str, records: &[RegistrarRecord]) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(domain.to_string(), records.to_vec());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_client_basic() {
        let client = MemoryRegistryClient::new();

        // Unknown domain is empty, not an error
        assert!(client.fetch_all("example.com").await.unwrap().is_empty());
        assert!(client.is_empty().await);

        let records = vec![
            RegistrarRecord::new("www", "A", "1.2.3.4", 600),
            RegistrarRecord::new("@", "MX", "mail.example.com", 3600),
        ];
        client.replace_all("example.com", &records).await.unwrap();

        assert_eq!(client.len().await, 1);
        assert_eq!(client.fetch_all("example.com").await.unwrap(), records);
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_list() {
        let client = MemoryRegistryClient::with_domains([(
            "example.com",
            vec![RegistrarRecord::new("old", "A", "1.1.1.1", 600)],
        )]);

        let replacement = vec![RegistrarRecord::new("new", "A", "2.2.2.2", 600)];
        client.replace_all("example.com", &replacement).await.unwrap();

        assert_eq!(client.records("example.com").await, Some(replacement));
        assert_eq!(client.records("example.org").await, None);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let client = MemoryRegistryClient::new();
        let clone = client.clone();

        clone
            .replace_all("example.com", &[RegistrarRecord::new("www", "A", "1.2.3.4", 0)])
            .await
            .unwrap();

        assert_eq!(client.fetch_all("example.com").await.unwrap().len(), 1);
    }
}
