// # extdns-core
//
// Core library for reconciling desired DNS endpoints against registrars
// whose API only supports "list all records" and "replace all records" per
// domain.
//
// ## Architecture Overview
//
// - **DomainFilter**: Decides which names this instance may mutate
// - **codec**: Maps registrar records to generic endpoints and back
// - **RegistryClient**: Trait for the registrar transport (fetch all / replace all)
// - **Reconciler**: Turns a create/update/delete change set into one
//   fetch-merge-replace pass per touched domain
// - **ProviderRegistry**: Plugin-based registry for registrar providers
//
// ## Design Principles
//
// 1. **Replace-only**: No per-record calls; every mutation is a full domain list
// 2. **Unmanaged records survive**: Only (name, type) keys named by a change are touched
// 3. **Failure isolation**: One domain's failure never stops the others
// 4. **Library-First**: All core functionality can be used as a library

pub mod codec;
pub mod config;
pub mod domain_filter;
pub mod endpoint;
pub mod error;
pub mod memory;
pub mod reconciler;
pub mod record;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use traits::{RegistryClient, RegistryClientFactory};
pub use reconciler::{ApplyReport, DomainOutcome, Reconciler};
pub use registry::ProviderRegistry;
pub use config::{ApiEnvironment, DomainFilterConfig, ProviderConfig, ReconcilerConfig, SyncConfig};
pub use domain_filter::DomainFilter;
pub use endpoint::{ChangeSet, Endpoint, ProviderSpecificProperty};
pub use record::RegistrarRecord;
pub use error::{ApplyFailures, DomainOperation, Error, Result};
pub use memory::MemoryRegistryClient;
