//! Configuration types for the extdns system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::domain_filter::DomainFilter;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Registrar provider configuration
    pub provider: ProviderConfig,

    /// Managed domains
    #[serde(default)]
    pub domain_filter: DomainFilterConfig,

    /// Optional reconciler settings
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.domain_filter.validate()?;
        self.reconciler.validate()?;
        Ok(())
    }
}

/// Registrar API environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiEnvironment {
    /// Sandbox ("OTE") environment
    #[default]
    #[serde(rename = "ote", alias = "sandbox")]
    Ote,
    /// Production environment
    #[serde(rename = "prod", alias = "production")]
    Production,
}

impl ApiEnvironment {
    /// Parse an environment name (`ote`, `sandbox`, `prod`, `production`)
    pub fn parse(value: &str) -> Result<Self, crate::Error> {
        match value.trim().to_lowercase().as_str() {
            "ote" | "sandbox" => Ok(Self::Ote),
            "prod" | "production" => Ok(Self::Production),
            other => Err(crate::Error::config(format!(
                "Unknown API environment '{}'. Supported: ote, prod",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ote => "ote",
            Self::Production => "prod",
        }
    }
}

/// Registrar provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// GoDaddy domains API
    #[serde(rename = "godaddy")]
    GoDaddy {
        /// API key
        api_key: String,
        /// API secret
        api_secret: String,
        /// Sandbox or production
        #[serde(default)]
        environment: ApiEnvironment,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::GoDaddy {
                api_key,
                api_secret,
                ..
            } => {
                if api_key.trim().is_empty() {
                    return Err(crate::Error::config("GoDaddy API key cannot be empty"));
                }
                if api_secret.trim().is_empty() {
                    return Err(crate::Error::config("GoDaddy API secret cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::GoDaddy { .. } => "godaddy",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::GoDaddy {
            api_key: String::new(),
            api_secret: String::new(),
            environment: ApiEnvironment::default(),
        }
    }
}

/// Managed domain configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainFilterConfig {
    /// Root domains this instance may mutate
    #[serde(default)]
    pub domains: Vec<String>,

    /// Accept an empty `domains` list as "every domain"
    ///
    /// Off by default: an empty list then fails validation instead of
    /// silently authorizing every domain on the account.
    #[serde(default)]
    pub allow_all_when_empty: bool,
}

impl DomainFilterConfig {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            allow_all_when_empty: false,
        }
    }

    /// Explicitly authorize every domain when the list is empty
    pub fn allow_all() -> Self {
        Self {
            domains: Vec::new(),
            allow_all_when_empty: true,
        }
    }

    /// Validate the filter configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.build().is_empty() && !self.allow_all_when_empty {
            return Err(crate::Error::config(
                "No managed domains configured. Set domains, or set \
                 allow_all_when_empty to manage every domain",
            ));
        }
        Ok(())
    }

    /// Build the runtime filter
    pub fn build(&self) -> DomainFilter {
        DomainFilter::new(&self.domains)
    }
}

/// Reconciler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Maximum number of domains processed at the same time
    #[serde(default = "default_max_concurrent_domains")]
    pub max_concurrent_domains: usize,

    /// Fetch and merge, but never submit replacement lists
    #[serde(default)]
    pub dry_run: bool,
}

impl ReconcilerConfig {
    /// Validate the reconciler configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_concurrent_domains == 0 {
            return Err(crate::Error::config("max_concurrent_domains must be > 0"));
        }
        Ok(())
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_domains: default_max_concurrent_domains(),
            dry_run: false,
        }
    }
}

fn default_max_concurrent_domains() -> usize {
    4
}
