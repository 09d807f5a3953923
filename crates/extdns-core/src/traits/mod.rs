//! Core traits for the extdns system
//!
//! - [`RegistryClient`]: list and replace the records of one registrar domain

pub mod registry_client;

pub use registry_client::{RegistryClient, RegistryClientFactory};
