//! Registrar-native record representation
//!
//! One `RegistrarRecord` is one (name, type, single value) tuple. The JSON
//! shape is what the registrar's `/v1/domains/{domain}/records` endpoint
//! returns and accepts.

use serde::{Deserialize, Serialize};
use std::fmt;

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// A single record as the registrar stores it
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistrarRecord {
    /// Record name, relative (`www`, `@`) or absolute
    pub name: String,

    /// Record value
    pub data: String,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,

    /// Time-to-live in seconds, zero when unspecified
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u32,

    /// SRV only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,

    /// MX and SRV only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    /// SRV only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// SRV only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// SRV only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl RegistrarRecord {
    /// Create a plain record with no type-specific fields
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        data: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            record_type: record_type.into(),
            ttl,
            ..Default::default()
        }
    }
}

impl fmt::Display for RegistrarRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.record_type, self.name, self.data)
    }
}
