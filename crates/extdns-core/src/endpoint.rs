//! Generic, registrar-agnostic DNS endpoint model
//!
//! The shapes here follow the JSON the upstream external-dns controller
//! produces (`dnsName`, `targets`, `recordType`, `recordTTL`, ...), so a
//! change set can be read straight off the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider-specific key/value attached to an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// One DNS name/type with all of its target values
///
/// A `record_ttl` of zero means "unspecified", not "zero seconds".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully-qualified DNS name
    pub dns_name: String,

    /// Target values; one registrar record per entry
    #[serde(default)]
    pub targets: Vec<String>,

    /// Record type (A, CNAME, TXT, MX, SRV, ...)
    pub record_type: String,

    /// Time-to-live in seconds, zero when unspecified
    #[serde(rename = "recordTTL", default)]
    pub record_ttl: u32,

    /// Extra registrar-specific fields (MX/SRV priority, weight, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

impl Endpoint {
    /// Create an endpoint without TTL
    pub fn new<T: Into<String>>(
        dns_name: impl Into<String>,
        record_type: impl Into<String>,
        targets: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            dns_name: dns_name.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            record_type: record_type.into(),
            record_ttl: 0,
            provider_specific: Vec::new(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = ttl;
        self
    }

    /// Set (or replace) a provider-specific property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Set (or replace) a provider-specific property in place
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.provider_specific.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self
                .provider_specific
                .push(ProviderSpecificProperty { name, value }),
        }
    }

    /// Look up a provider-specific property
    pub fn property(&self, name: &str) -> Option<&str> {
        self.provider_specific
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Whether this endpoint has the given record type (case-insensitive)
    pub fn is_type(&self, record_type: &str) -> bool {
        self.record_type.eq_ignore_ascii_case(record_type)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.dns_name,
            self.record_ttl,
            self.record_type,
            self.targets.join(";")
        )
    }
}

/// Desired mutations for one reconciliation cycle
///
/// Updates carry only the new desired state; the old state is implied by
/// whatever the registrar currently holds for the same name and type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(rename = "Create", default)]
    pub create: Vec<Endpoint>,

    #[serde(rename = "UpdateNew", alias = "Update", default)]
    pub update: Vec<Endpoint>,

    #[serde(rename = "Delete", default)]
    pub delete: Vec<Endpoint>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create(mut self, endpoint: Endpoint) -> Self {
        self.create.push(endpoint);
        self
    }

    pub fn with_update(mut self, endpoint: Endpoint) -> Self {
        self.update.push(endpoint);
        self
    }

    pub fn with_delete(mut self, endpoint: Endpoint) -> Self {
        self.delete.push(endpoint);
        self
    }

    /// Total number of endpoints across all three lists
    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
