//! Error types for the extdns system
//!
//! This module defines all error types used throughout the crate.

use std::fmt;
use thiserror::Error;

/// Result type alias for extdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the extdns system
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials were rejected by the registrar (HTTP 401/403)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network failure, timeout, throttling or registrar-side 5xx
    #[error("Transport error: {0}")]
    Transport(String),

    /// Registrar response could not be parsed into the expected record shape
    #[error("Decode error: {message}")]
    Decode {
        /// Parser message
        message: String,
        /// Raw response body, kept for diagnosis
        body: String,
    },

    /// Any other non-success registrar response
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Work for a domain was never started because the caller cancelled
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// One or more domains failed during an apply pass
    #[error("{0}")]
    Apply(ApplyFailures),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a decode error carrying the raw body
    pub fn decode(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Create an API error for an unexpected status
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the next reconciliation cycle may reasonably retry
    ///
    /// Only transport failures are transient. Authentication and decode
    /// failures will repeat until someone fixes credentials or the registrar.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Apply(failures) => failures.iter().all(|f| f.error.is_transient()),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Phase of a per-domain pass in which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainOperation {
    /// Listing the current records
    Fetch,
    /// Submitting the replacement list
    Replace,
    /// Never started (cancelled)
    Start,
}

impl fmt::Display for DomainOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainOperation::Fetch => f.write_str("fetch"),
            DomainOperation::Replace => f.write_str("replace"),
            DomainOperation::Start => f.write_str("start"),
        }
    }
}

/// A single domain's failure inside an apply pass
#[derive(Debug)]
pub struct DomainFailure {
    /// Managed root domain
    pub domain: String,
    /// Phase that failed
    pub operation: DomainOperation,
    /// Underlying error
    pub error: Error,
}

/// Aggregate of every domain that failed during one apply pass
///
/// Domains absent from this list either succeeded or were never touched.
#[derive(Debug, Default)]
pub struct ApplyFailures {
    failures: Vec<DomainFailure>,
}

impl ApplyFailures {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn push(&mut self, domain: impl Into<String>, operation: DomainOperation, error: Error) {
        self.failures.push(DomainFailure {
            domain: domain.into(),
            operation,
            error,
        });
    }

    /// Names of the failed domains, in the order they were recorded
    pub fn domains(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.domain.as_str()).collect()
    }

    /// Iterate over the individual failures
    pub fn iter(&self) -> impl Iterator<Item = &DomainFailure> {
        self.failures.iter()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn the aggregate into `Ok(value)` when nothing failed
    pub fn into_result<T>(mut self, value: T) -> Result<T> {
        if self.failures.is_empty() {
            return Ok(value);
        }
        self.failures.sort_by(|a, b| a.domain.cmp(&b.domain));
        Err(Error::Apply(self))
    }
}

impl fmt::Display for ApplyFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} domain(s) failed:", self.failures.len())?;
        for failure in &self.failures {
            write!(
                f,
                " [{} ({}): {}]",
                failure.domain, failure.operation, failure.error
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_names_every_failed_domain() {
        let mut failures = ApplyFailures::new();
        failures.push("b.com", DomainOperation::Replace, Error::transport("timeout"));
        failures.push("a.com", DomainOperation::Fetch, Error::auth("bad key"));

        let err = failures.into_result(()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a.com (fetch)"));
        assert!(message.contains("b.com (replace)"));

        match err {
            Error::Apply(failures) => assert_eq!(failures.domains(), vec!["a.com", "b.com"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_aggregate_is_success() {
        assert_eq!(ApplyFailures::new().into_result(7).unwrap(), 7);
    }

    #[test]
    fn transience() {
        assert!(Error::transport("reset").is_transient());
        assert!(!Error::auth("denied").is_transient());
        assert!(!Error::decode("eof", "").is_transient());

        let mut mixed = ApplyFailures::new();
        mixed.push("a.com", DomainOperation::Fetch, Error::transport("reset"));
        mixed.push("b.com", DomainOperation::Fetch, Error::auth("denied"));
        assert!(!Error::Apply(mixed).is_transient());
    }
}
