// # Registry Client Trait
//
// Defines the transport boundary to a registrar whose API only offers
// "list all records for a domain" and "replace all records for a domain".
//
// ## Implementations
//
// - GoDaddy: `extdns-provider-godaddy` crate
// - In-memory: `extdns_core::memory::MemoryRegistryClient`
//
// ## Usage
//
// ```rust,ignore
// use extdns_core::RegistryClient;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* RegistryClient implementation */;
//
//     let mut records = client.fetch_all("example.com").await?;
//     records.retain(|r| r.record_type != "TXT");
//     client.replace_all("example.com", &records).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::RegistrarRecord;

/// Trait for registrar transport implementations
///
/// # Thread Safety
///
/// One client is shared by every concurrent domain worker of an apply pass,
/// so implementations must be `Send + Sync` and their connection pool must
/// tolerate concurrent use.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to the registrar only
/// - ✅ Attach credentials to each request
/// - ✅ Parse registrar responses into [`RegistrarRecord`]s
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (the next reconciliation cycle owns retries)
/// - ❌ Filter, merge or otherwise interpret records (owned by `Reconciler`)
/// - ❌ Cache records or credentials beyond the client's lifetime
/// - ❌ Spawn tasks or threads
///
/// # Errors
///
/// - `Error::Transport` for network failures, timeouts, 429 and 5xx
/// - `Error::Authentication` when credentials are rejected
/// - `Error::Decode` when the body cannot be parsed
/// - `Error::Api` for any other non-success status
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch every record held for `domain`
    ///
    /// The result includes records this system does not manage.
    async fn fetch_all(&self, domain: &str) -> Result<Vec<RegistrarRecord>, crate::Error>;

    /// Replace every record held for `domain` with `records`
    ///
    /// The registrar applies the list transactionally: after a failure the
    /// domain holds either the old or the new list, and the caller cannot
    /// tell which. Re-fetch before acting on that domain again.
    async fn replace_all(
        &self,
        domain: &str,
        records: &[RegistrarRecord],
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing registry clients from configuration
pub trait RegistryClientFactory: Send + Sync {
    /// Create a client from provider configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<std::sync::Arc<dyn RegistryClient>, crate::Error>;
}
