//! Replace-only reconciler
//!
//! The Reconciler is responsible for:
//! - Dropping changes outside the managed domains
//! - Fetching the current record list of every touched domain
//! - Merging the changes into a full replacement list
//! - Submitting that list, one domain at a time
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  ChangeSet   │
//! └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐   drop + warn   ┌─────────────┐
//! │ DomainFilter │ ──────────────▶ │  (ignored)  │
//! └──────────────┘                 └─────────────┘
//!        │ per-domain slices
//!        ▼
//! ┌──────────────────────────────────────────────┐
//! │ for each domain (bounded concurrency):       │
//! │   fetch_all ─▶ merge_records ─▶ replace_all  │
//! └──────────────────────────────────────────────┘
//!        │
//!        ▼
//! ApplyReport, or Error::Apply naming every failed domain
//! ```
//!
//! The registrar has no per-record create/update/delete, so a change set is
//! never translated into individual calls. Each touched domain gets exactly
//! one fetch and at most one replace; untouched domains are never contacted.
//!
//! ## Failure isolation
//!
//! Domains share nothing but the read-only filter and the client. A failure
//! in one domain is recorded and the remaining domains still run. The pass
//! then returns `Error::Apply` listing every failed domain, so partial
//! success is never reported as success.
//!
//! ## Cancellation
//!
//! [`Reconciler::apply_with_shutdown`] takes a `watch` receiver. Once it reads
//! `true`, domains that have not started are reported as cancelled and no
//! replacement is submitted for a domain whose submit has not begun. A
//! replacement already in flight always completes.

pub mod plan;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::config::SyncConfig;
use crate::domain_filter::DomainFilter;
use crate::endpoint::{ChangeSet, Endpoint};
use crate::error::{ApplyFailures, DomainOperation, Error, Result};
use crate::traits::RegistryClient;

pub use plan::{ChangePlan, DomainChanges, merge_records, qualify};

/// What happened to one domain during an apply pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOutcome {
    /// A replacement list was submitted
    Submitted {
        /// Number of records in the submitted list
        records: usize,
    },
    /// The merged list equals the current one; nothing was submitted
    Unchanged,
    /// Dry-run mode: the list was computed but not submitted
    DryRun {
        /// Number of records that would have been submitted
        records: usize,
    },
}

/// Result of a fully successful apply pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Per-domain outcomes, keyed by managed root domain
    pub outcomes: BTreeMap<String, DomainOutcome>,
    /// Endpoints dropped because they fall outside the managed domains
    pub dropped: usize,
}

type DomainResult = std::result::Result<DomainOutcome, (DomainOperation, Error)>;

/// Replace-only reconciler
///
/// One instance serves any number of apply passes; it holds no state between
/// them.
pub struct Reconciler {
    /// Transport to the registrar
    client: Arc<dyn RegistryClient>,

    /// Authorization boundary
    filter: DomainFilter,

    /// Upper bound on domains processed at the same time
    max_concurrent_domains: usize,

    /// Compute but do not submit
    dry_run: bool,
}

impl Reconciler {
    /// Create a reconciler from validated configuration
    ///
    /// Provider settings are not consulted here; `client` has already been
    /// built from them.
    pub fn new(client: Arc<dyn RegistryClient>, config: &SyncConfig) -> Result<Self> {
        config.domain_filter.validate()?;
        config.reconciler.validate()?;

        let filter = config.domain_filter.build();
        if filter.is_empty() {
            warn!("Domain filter is empty: every domain on the account is managed");
        }

        Ok(Self {
            client,
            filter,
            max_concurrent_domains: config.reconciler.max_concurrent_domains,
            dry_run: config.reconciler.dry_run,
        })
    }

    /// Create a reconciler with default settings around an existing filter
    pub fn with_filter(client: Arc<dyn RegistryClient>, filter: DomainFilter) -> Self {
        let defaults = crate::config::ReconcilerConfig::default();
        Self {
            client,
            filter,
            max_concurrent_domains: defaults.max_concurrent_domains,
            dry_run: defaults.dry_run,
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the concurrency bound (at least one)
    pub fn with_max_concurrent_domains(mut self, max: usize) -> Self {
        self.max_concurrent_domains = max.max(1);
        self
    }

    pub fn domain_filter(&self) -> &DomainFilter {
        &self.filter
    }

    /// List the records of every configured domain as endpoints
    ///
    /// Names are qualified against their domain. The listing includes
    /// records this system does not own. An empty filter has no enumerable
    /// domains and yields an empty list.
    pub async fn records(&self) -> Result<Vec<Endpoint>> {
        info!(
            "Fetching DNS records from {} for {} domain(s)",
            self.client.provider_name(),
            self.filter.domains().len()
        );

        if self.filter.is_empty() {
            warn!("Domain filter is empty, no domains to enumerate");
            return Ok(Vec::new());
        }

        let fetched: Vec<_> = stream::iter(self.filter.domains())
            .map(|domain| async move {
                debug!("DNS records for domain '{}'", domain);
                self.client
                    .fetch_all(domain)
                    .await
                    .map(|records| (domain, records))
            })
            .buffered(self.max_concurrent_domains)
            .collect()
            .await;

        let mut endpoints = Vec::new();
        for result in fetched {
            let (domain, records) = result?;
            for record in &records {
                let mut endpoint = codec::to_endpoint(record);
                endpoint.dns_name = qualify(&endpoint.dns_name, domain);
                debug!("Got record: {}", endpoint);
                endpoints.push(endpoint);
            }
        }

        Ok(endpoints)
    }

    /// Apply a change set
    ///
    /// # Returns
    ///
    /// - `Ok(ApplyReport)`: every touched domain succeeded
    /// - `Err(Error::Apply)`: one or more domains failed; the rest were
    ///   still processed
    pub async fn apply(&self, changes: ChangeSet) -> Result<ApplyReport> {
        self.apply_with_shutdown(changes, None).await
    }

    /// Apply a change set, stopping new per-domain work once `shutdown`
    /// reads `true`
    pub async fn apply_with_shutdown(
        &self,
        changes: ChangeSet,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<ApplyReport> {
        info!(
            "Applying changes... [Create ({}), Update ({}), Delete ({})]{}",
            changes.create.len(),
            changes.update.len(),
            changes.delete.len(),
            if self.dry_run { " [DRY-RUN]" } else { "" }
        );

        let plan = ChangePlan::build(&self.filter, changes);
        let mut report = ApplyReport {
            dropped: plan.dropped,
            ..Default::default()
        };

        if plan.is_empty() {
            info!("No changes within managed domains");
            return Ok(report);
        }

        let shutdown = shutdown.as_ref();
        let results: Vec<(String, DomainResult)> = stream::iter(plan.domains)
            .map(|(domain, changes)| async move {
                let result = self.reconcile_domain(&domain, &changes, shutdown).await;
                (domain, result)
            })
            .buffer_unordered(self.max_concurrent_domains)
            .collect()
            .await;

        let mut failures = ApplyFailures::new();
        for (domain, result) in results {
            match result {
                Ok(outcome) => {
                    report.outcomes.insert(domain, outcome);
                }
                Err((operation, err)) => failures.push(domain, operation, err),
            }
        }

        if !failures.is_empty() {
            error!(
                "Apply finished with {} failed domain(s), {} succeeded",
                failures.len(),
                report.outcomes.len()
            );
        } else {
            info!("Done applying changes to {} domain(s)", report.outcomes.len());
        }

        failures.into_result(report)
    }

    /// Fetch, merge and submit one domain
    async fn reconcile_domain(
        &self,
        domain: &str,
        changes: &DomainChanges,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> DomainResult {
        if is_cancelled(shutdown) {
            warn!("Skipping domain {}: apply cancelled", domain);
            return Err((
                DomainOperation::Start,
                Error::Cancelled(format!("{} was not started", domain)),
            ));
        }

        let current = self.client.fetch_all(domain).await.map_err(|e| {
            error!("Failed to fetch records for {}: {}", domain, e);
            (DomainOperation::Fetch, e)
        })?;

        let merged = merge_records(domain, &current, changes);

        if plan::same_records(&current, &merged) {
            info!("Domain {} already up to date ({} records)", domain, current.len());
            return Ok(DomainOutcome::Unchanged);
        }

        if self.dry_run {
            info!(
                "[DRY-RUN] Would replace {} record(s) of {} with {} record(s): {}",
                current.len(),
                domain,
                merged.len(),
                serde_json::to_string(&merged).unwrap_or_default()
            );
            return Ok(DomainOutcome::DryRun {
                records: merged.len(),
            });
        }

        if is_cancelled(shutdown) {
            warn!("Not submitting {}: apply cancelled", domain);
            return Err((
                DomainOperation::Replace,
                Error::Cancelled(format!("replacement for {} was not submitted", domain)),
            ));
        }

        info!(
            "Replacing records of {}: {} -> {} record(s)",
            domain,
            current.len(),
            merged.len()
        );

        match self.client.replace_all(domain, &merged).await {
            Ok(()) => Ok(DomainOutcome::Submitted {
                records: merged.len(),
            }),
            Err(e) => {
                error!(
                    "Failed to replace records for {}: {} (domain state unknown, re-fetch before retrying)",
                    domain, e
                );
                Err((DomainOperation::Replace, e))
            }
        }
    }
}

fn is_cancelled(shutdown: Option<&watch::Receiver<bool>>) -> bool {
    shutdown.is_some_and(|rx| *rx.borrow())
}
