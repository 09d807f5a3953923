// # GoDaddy Registry Client
//
// This crate provides the GoDaddy implementation of `RegistryClient`.
//
// ## API Shape
//
// The GoDaddy domains API has no per-record delete. The only operations used
// here are:
//
// - List all records: GET `/v1/domains/{domain}/records`
// - Replace all records: PUT `/v1/domains/{domain}/records` (body = full list)
//
// The replace is transactional on GoDaddy's side: after a failed PUT the
// domain holds either the old or the new list.
//
// ## Implementation Notes
//
// - ✅ One HTTP request per trait call
// - ✅ Full error propagation (no retry, no backoff: the next cycle owns that)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ 401/403 reported as authentication failures, 429/5xx as transport failures
// - ✅ Undecodable bodies reported with the raw body attached
// - ❌ NO caching of records or credentials beyond the client's lifetime
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - API key and secret NEVER appear in logs or Debug output
// - Client construction fails if either credential is empty
//
// ## Environments
//
// - OTE (sandbox): https://api.ote-godaddy.com
// - Production: https://api.godaddy.com

use async_trait::async_trait;
use extdns_core::config::{ApiEnvironment, ProviderConfig};
use extdns_core::traits::{RegistryClient, RegistryClientFactory};
use extdns_core::{Error, RegistrarRecord, Result};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// GoDaddy OTE (sandbox) API base URL
pub const GODADDY_OTE_URL: &str = "https://api.ote-godaddy.com";

/// GoDaddy production API base URL
pub const GODADDY_PROD_URL: &str = "https://api.godaddy.com";

/// Client identifier sent with every request
pub const CLIENT_USER_AGENT: &str = "extdns-godaddy";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body GoDaddy returns on non-success responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Base URL for an API environment
pub fn base_url_for(environment: ApiEnvironment) -> &'static str {
    match environment {
        ApiEnvironment::Ote => GODADDY_OTE_URL,
        ApiEnvironment::Production => GODADDY_PROD_URL,
    }
}

/// GoDaddy registry client
///
/// One instance is shared by every domain worker of an apply pass; the
/// underlying `reqwest::Client` pools connections and is safe for
/// concurrent use.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key or secret.
pub struct GoDaddyClient {
    /// ⚠️ NEVER log this value
    api_key: String,

    /// ⚠️ NEVER log this value
    api_secret: String,

    /// Sandbox or production
    environment: ApiEnvironment,

    /// API base URL, derived from the environment unless overridden
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for GoDaddyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoDaddyClient")
            .field("api_key", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GoDaddyClient {
    /// Create a new GoDaddy client
    ///
    /// Surrounding whitespace is trimmed from both credentials.
    ///
    /// # Errors
    ///
    /// `Error::Config` if a credential is empty or the HTTP client cannot
    /// be built.
    pub fn new(
        api_key: impl AsRef<str>,
        api_secret: impl AsRef<str>,
        environment: ApiEnvironment,
    ) -> Result<Self> {
        let api_key = api_key.as_ref().trim().to_string();
        let api_secret = api_secret.as_ref().trim().to_string();

        if api_key.is_empty() {
            return Err(Error::config("GoDaddy API key cannot be empty"));
        }
        if api_secret.is_empty() {
            return Err(Error::config("GoDaddy API secret cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_secret,
            environment,
            base_url: base_url_for(environment).to_string(),
            client,
        })
    }

    /// Point the client at a different base URL (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn environment(&self) -> ApiEnvironment {
        self.environment
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}/v1/domains/{}/records", self.base_url, domain)
    }

    fn authorization(&self) -> String {
        format!("sso-key {}:{}", self.api_key, self.api_secret)
    }

    /// Attach the headers every GoDaddy request carries
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, self.authorization())
            .header(USER_AGENT, CLIENT_USER_AGENT)
    }

    /// Turn a non-success response into the matching error kind
    async fn check_status(
        &self,
        response: reqwest::Response,
        domain: &str,
        operation: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        let err = status_error(status, &body, domain, operation);
        tracing::error!("GoDaddy {} for {} failed: {}", operation, domain, err);
        Err(err)
    }
}

/// Map a non-success status to an error
fn status_error(status: StatusCode, body: &str, domain: &str, operation: &str) -> Error {
    let detail = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{}: {}", code, message),
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => body.to_string(),
    };

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "GoDaddy rejected the API key/secret ({} {} on {}): {}",
            status, operation, domain, detail
        )),
        429 => Error::transport(format!(
            "Rate limit exceeded ({} {} on {}): {}",
            status, operation, domain, detail
        )),
        500..=599 => Error::transport(format!(
            "GoDaddy server error (transient) ({} {} on {}): {}",
            status, operation, domain, detail
        )),
        code => Error::api(code, format!("{} on {}: {}", operation, domain, detail)),
    }
}

fn send_error(e: reqwest::Error, domain: &str, operation: &str) -> Error {
    Error::transport(format!(
        "HTTP request failed ({} on {}): {}",
        operation, domain, e
    ))
}

#[async_trait]
impl RegistryClient for GoDaddyClient {
    /// List every record of `domain`
    ///
    /// ```http
    /// GET /v1/domains/{domain}/records
    /// Authorization: sso-key <key>:<secret>
    /// ```
    async fn fetch_all(&self, domain: &str) -> Result<Vec<RegistrarRecord>> {
        let url = self.records_url(domain);
        tracing::debug!("GET {}", url);

        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| send_error(e, domain, "list records"))?;

        let response = self.check_status(response, domain, "list records").await?;

        let body = response
            .text()
            .await
            .map_err(|e| send_error(e, domain, "list records"))?;

        serde_json::from_str::<Vec<RegistrarRecord>>(&body).map_err(|e| {
            tracing::error!(
                "Failed to decode records for {}: {} (body: {})",
                domain,
                e,
                body
            );
            Error::decode(format!("records for {}: {}", domain, e), body)
        })
    }

    /// Replace every record of `domain`
    ///
    /// ```http
    /// PUT /v1/domains/{domain}/records
    /// Authorization: sso-key <key>:<secret>
    ///
    /// [{"name": "www", "data": "1.2.3.4", "type": "A", "ttl": 600}, ...]
    /// ```
    async fn replace_all(&self, domain: &str, records: &[RegistrarRecord]) -> Result<()> {
        let url = self.records_url(domain);
        tracing::debug!("PUT {} ({} records)", url, records.len());

        let response = self
            .request(reqwest::Method::PUT, &url)
            .json(records)
            .send()
            .await
            .map_err(|e| send_error(e, domain, "replace records"))?;

        self.check_status(response, domain, "replace records").await?;

        tracing::info!("Replaced {} record(s) for {}", records.len(), domain);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "godaddy"
    }
}

/// Factory for creating GoDaddy clients
pub struct GoDaddyFactory;

impl RegistryClientFactory for GoDaddyFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn RegistryClient>> {
        match config {
            ProviderConfig::GoDaddy {
                api_key,
                api_secret,
                environment,
            } => {
                tracing::info!("Using GoDaddy API ({})", environment.as_str());
                Ok(Arc::new(GoDaddyClient::new(
                    api_key,
                    api_secret,
                    *environment,
                )?))
            }
            _ => Err(Error::config("Invalid config for GoDaddy provider")),
        }
    }
}

/// Register the GoDaddy provider with a registry
///
/// # Example
///
/// ```rust
/// use extdns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// extdns_provider_godaddy::register(&registry);
/// assert!(registry.has_provider("godaddy"));
/// ```
pub fn register(registry: &extdns_core::ProviderRegistry) {
    registry.register_provider("godaddy", Box::new(GoDaddyFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str, secret: &str) -> ProviderConfig {
        ProviderConfig::GoDaddy {
            api_key: key.to_string(),
            api_secret: secret.to_string(),
            environment: ApiEnvironment::Ote,
        }
    }

    #[test]
    fn test_factory_creation() {
        let client = GoDaddyFactory.create(&config("key", "secret"));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().provider_name(), "godaddy");
    }

    #[test]
    fn test_factory_missing_credentials() {
        assert!(GoDaddyFactory.create(&config("", "secret")).is_err());
        assert!(GoDaddyFactory.create(&config("key", " ")).is_err());
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let other = ProviderConfig::Custom {
            factory: "route53".to_string(),
            config: serde_json::json!({}),
        };
        assert!(matches!(GoDaddyFactory.create(&other), Err(Error::Config(_))));
    }

    #[test]
    fn test_base_url_follows_environment() {
        let ote = GoDaddyClient::new("k", "s", ApiEnvironment::Ote).unwrap();
        let prod = GoDaddyClient::new("k", "s", ApiEnvironment::Production).unwrap();

        assert_eq!(ote.base_url(), GODADDY_OTE_URL);
        assert_eq!(prod.base_url(), GODADDY_PROD_URL);
        assert_eq!(
            prod.records_url("example.com"),
            "https://api.godaddy.com/v1/domains/example.com/records"
        );
    }

    #[test]
    fn test_base_url_override_strips_trailing_slash() {
        let client = GoDaddyClient::new("k", "s", ApiEnvironment::Ote)
            .unwrap()
            .with_base_url("http://127.0.0.1:8080/");
        assert_eq!(
            client.records_url("example.com"),
            "http://127.0.0.1:8080/v1/domains/example.com/records"
        );
    }

    #[test]
    fn test_credentials_trimmed_into_authorization() {
        let client = GoDaddyClient::new("  key \n", "\tsecret ", ApiEnvironment::Ote).unwrap();
        assert_eq!(client.authorization(), "sso-key key:secret");
    }

    #[test]
    fn test_credentials_not_exposed_in_debug() {
        let client = GoDaddyClient::new("key_12345", "secret_67890", ApiEnvironment::Ote).unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("key_12345"));
        assert!(!debug_str.contains("secret_67890"));
        assert!(debug_str.contains("GoDaddyClient"));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"code":"UNABLE_TO_AUTHENTICATE","message":"Unable to authenticate"}"#;

        let err = status_error(StatusCode::UNAUTHORIZED, body, "example.com", "list records");
        assert!(matches!(err, Error::Authentication(_)));
        assert!(err.to_string().contains("UNABLE_TO_AUTHENTICATE: Unable to authenticate"));

        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "", "example.com", "list records"),
            Error::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "", "example.com", "list records"),
            Error::Transport(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "", "example.com", "list records"),
            Error::Transport(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "", "example.com", "list records"),
            Error::Api { status: 404, .. }
        ));
    }
}
