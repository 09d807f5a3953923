// # extdnsd - external-dns registrar daemon
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add merge logic, filtering logic, or retry logic here
// - All reconciliation logic MUST be in extdns-core
// - Configuration is via environment variables ONLY
//
// The extdnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Registering providers
// 4. Running one pass: list records, or apply a change set
//
// ## Configuration
//
// ### Provider
// - `EXTDNS_PROVIDER_TYPE`: Provider type (godaddy)
// - `EXTDNS_GODADDY_API_KEY`: API key
// - `EXTDNS_GODADDY_API_SECRET`: API secret
// - `EXTDNS_GODADDY_ENV`: `ote` (sandbox, default) or `prod`
//
// ### Domains
// - `EXTDNS_DOMAIN_FILTER`: Comma-separated list of managed root domains
// - `EXTDNS_ALLOW_ALL_DOMAINS`: Set to `true` to manage every domain when the filter is empty
//
// ### Reconciler
// - `EXTDNS_MAX_CONCURRENT_DOMAINS`: Domains processed at the same time (default 4)
// - `EXTDNS_MODE`: `sync` (default) or `dry-run`
// - `EXTDNS_CHANGES_FILE`: JSON change set to apply; when unset the current records are printed
//
// ### Logging
// - `EXTDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export EXTDNS_GODADDY_API_KEY=your_key
// export EXTDNS_GODADDY_API_SECRET=your_secret
// export EXTDNS_DOMAIN_FILTER=example.com,example.org
// export EXTDNS_CHANGES_FILE=/run/extdns/changes.json
//
// extdnsd
// ```

use anyhow::{Context, Result};
use extdns_core::{
    ApiEnvironment, ChangeSet, DomainFilterConfig, ProviderConfig, ProviderRegistry, Reconciler,
    ReconcilerConfig, SyncConfig,
};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
/// - 3: One or more domains failed to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtdnsExitCode {
    /// Pass completed
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// Some domains were applied, others failed
    PartialFailure = 3,
}

impl From<ExtdnsExitCode> for ExitCode {
    fn from(code: ExtdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    provider_type: String,
    api_key: String,
    api_secret: String,
    environment: String,
    domains: Vec<String>,
    allow_all_domains: bool,
    max_concurrent_domains: Option<usize>,
    mode: String,
    changes_file: Option<PathBuf>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from any variable source
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_concurrent_domains = match var("EXTDNS_MAX_CONCURRENT_DOMAINS") {
            Some(value) => Some(value.trim().parse().with_context(|| {
                format!("EXTDNS_MAX_CONCURRENT_DOMAINS is not a number: '{}'", value)
            })?),
            None => None,
        };

        Ok(Self {
            provider_type: var("EXTDNS_PROVIDER_TYPE").unwrap_or_else(|| "godaddy".to_string()),
            api_key: var("EXTDNS_GODADDY_API_KEY").unwrap_or_default(),
            api_secret: var("EXTDNS_GODADDY_API_SECRET").unwrap_or_default(),
            environment: var("EXTDNS_GODADDY_ENV").unwrap_or_else(|| "ote".to_string()),
            domains: var("EXTDNS_DOMAIN_FILTER")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            allow_all_domains: var("EXTDNS_ALLOW_ALL_DOMAINS")
                .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes")),
            max_concurrent_domains,
            mode: var("EXTDNS_MODE").unwrap_or_else(|| "sync".to_string()),
            changes_file: var("EXTDNS_CHANGES_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            log_level: var("EXTDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Provider and domain checks are delegated to the core config types;
    /// only the daemon's own variables are checked here.
    fn validate(&self) -> Result<()> {
        match self.provider_type.as_str() {
            "godaddy" => {}
            _ => anyhow::bail!(
                "EXTDNS_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: godaddy",
                self.provider_type
            ),
        }

        if self.api_key.trim().is_empty() {
            anyhow::bail!(
                "EXTDNS_GODADDY_API_KEY is required. \
                Set it via: export EXTDNS_GODADDY_API_KEY=your_key"
            );
        }
        if self.api_secret.trim().is_empty() {
            anyhow::bail!(
                "EXTDNS_GODADDY_API_SECRET is required. \
                Set it via: export EXTDNS_GODADDY_API_SECRET=your_secret"
            );
        }

        match self.mode.to_lowercase().as_str() {
            "sync" | "dry-run" => {}
            _ => anyhow::bail!(
                "EXTDNS_MODE '{}' is not valid. Valid modes: sync, dry-run",
                self.mode
            ),
        }

        if let Some(max) = self.max_concurrent_domains
            && (max == 0 || max > 64)
        {
            anyhow::bail!(
                "EXTDNS_MAX_CONCURRENT_DOMAINS must be between 1 and 64. Got: {}",
                max
            );
        }

        if let Some(ref path) = self.changes_file
            && !path.is_file()
        {
            anyhow::bail!("EXTDNS_CHANGES_FILE does not exist: {}", path.display());
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "EXTDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.sync_config()?.validate()?;

        Ok(())
    }

    fn dry_run(&self) -> bool {
        self.mode.eq_ignore_ascii_case("dry-run")
    }

    /// Translate daemon settings into the core configuration
    fn sync_config(&self) -> Result<SyncConfig> {
        let provider = ProviderConfig::GoDaddy {
            api_key: self.api_key.trim().to_string(),
            api_secret: self.api_secret.trim().to_string(),
            environment: ApiEnvironment::parse(&self.environment)?,
        };

        let domain_filter = DomainFilterConfig {
            domains: self.domains.clone(),
            allow_all_when_empty: self.allow_all_domains,
        };

        let mut reconciler = ReconcilerConfig {
            dry_run: self.dry_run(),
            ..Default::default()
        };
        if let Some(max) = self.max_concurrent_domains {
            reconciler.max_concurrent_domains = max;
        }

        Ok(SyncConfig {
            provider,
            domain_filter,
            reconciler,
        })
    }
}

/// Read a change set from a JSON file
fn load_changes(path: &Path) -> Result<ChangeSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read change set {}", path.display()))?;
    let changes: ChangeSet = serde_json::from_str(&content)
        .with_context(|| format!("Invalid change set in {}", path.display()))?;
    Ok(changes)
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExtdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ExtdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExtdnsExitCode::ConfigError.into();
    }

    info!("Starting extdnsd");
    info!(
        "Configuration loaded: {} managed domain(s)",
        config.domains.len()
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ExtdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Run one pass
async fn run_daemon(config: Config) -> ExtdnsExitCode {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "godaddy")]
    {
        info!("Registering GoDaddy provider");
        extdns_provider_godaddy::register(&registry);
    }

    let sync_config = match config.sync_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ExtdnsExitCode::ConfigError;
        }
    };

    let reconciler = match registry
        .create_client(&sync_config.provider)
        .and_then(|client| Reconciler::new(client, &sync_config))
    {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to initialize provider: {}", e);
            return ExtdnsExitCode::ConfigError;
        }
    };

    match config.changes_file {
        Some(ref path) => apply_changes(&reconciler, path).await,
        None => list_records(&reconciler).await,
    }
}

/// Print every managed record as JSON on stdout
async fn list_records(reconciler: &Reconciler) -> ExtdnsExitCode {
    let endpoints = match reconciler.records().await {
        Ok(endpoints) => endpoints,
        Err(e) => {
            error!("Failed to list records: {}", e);
            return ExtdnsExitCode::RuntimeError;
        }
    };

    match serde_json::to_string_pretty(&endpoints) {
        Ok(json) => {
            println!("{}", json);
            ExtdnsExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Failed to encode records: {}", e);
            ExtdnsExitCode::RuntimeError
        }
    }
}

/// Apply the change set in `path`, stopping new work on SIGINT/SIGTERM
async fn apply_changes(reconciler: &Reconciler, path: &Path) -> ExtdnsExitCode {
    let changes = match load_changes(path) {
        Ok(changes) => changes,
        Err(e) => {
            error!("{:#}", e);
            return ExtdnsExitCode::ConfigError;
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signals = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                warn!("Received {}, finishing in-flight domains", signal);
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Signal handling error: {}", e),
        }
    });

    let result = reconciler
        .apply_with_shutdown(changes, Some(shutdown_rx))
        .await;
    signals.abort();

    match result {
        Ok(report) => {
            info!(
                "Applied changes to {} domain(s), {} change(s) outside managed domains",
                report.outcomes.len(),
                report.dropped
            );
            ExtdnsExitCode::CleanShutdown
        }
        Err(extdns_core::Error::Apply(failures)) => {
            for failure in failures.iter() {
                error!(
                    "{} failed during {}: {}",
                    failure.domain, failure.operation, failure.error
                );
            }
            ExtdnsExitCode::PartialFailure
        }
        Err(e) => {
            error!("Apply error: {}", e);
            ExtdnsExitCode::RuntimeError
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
