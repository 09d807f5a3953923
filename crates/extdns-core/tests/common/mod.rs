//! Test doubles and common utilities for reconciler contract tests
//!
//! The doubles wrap `MemoryRegistryClient` so the registrar side keeps real
//! replace-all semantics while the test observes and perturbs every call.

#![allow(dead_code)]

use async_trait::async_trait;
use extdns_core::error::{Error, Result};
use extdns_core::{DomainFilter, MemoryRegistryClient, Reconciler, RegistrarRecord, RegistryClient};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Kind of failure to inject
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Auth,
    Transport,
    Decode,
}

impl Failure {
    fn to_error(self, domain: &str) -> Error {
        match self {
            Failure::Auth => Error::auth(format!("credentials rejected for {}", domain)),
            Failure::Transport => Error::transport(format!("connection reset for {}", domain)),
            Failure::Decode => Error::decode("expected array", "<html>oops</html>"),
        }
    }
}

/// A registry client that counts calls and can fail per domain
pub struct RecordingClient {
    /// Real storage with replace-all semantics
    pub store: MemoryRegistryClient,
    fetch_calls: Arc<Mutex<Vec<String>>>,
    replace_calls: Arc<Mutex<Vec<(String, Vec<RegistrarRecord>)>>>,
    fetch_failures: HashMap<String, Failure>,
    replace_failures: HashMap<String, Failure>,
    /// Artificial latency for every call
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    /// Flipped to `true` as soon as a replace begins
    cancel_on_replace: Option<watch::Sender<bool>>,
}

impl RecordingClient {
    pub fn new(store: MemoryRegistryClient) -> Self {
        Self {
            store,
            fetch_calls: Arc::new(Mutex::new(Vec::new())),
            replace_calls: Arc::new(Mutex::new(Vec::new())),
            fetch_failures: HashMap::new(),
            replace_failures: HashMap::new(),
            delay: Duration::ZERO,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            cancel_on_replace: None,
        }
    }

    pub fn failing_fetch(mut self, domain: &str, failure: Failure) -> Self {
        self.fetch_failures.insert(domain.to_string(), failure);
        self
    }

    pub fn failing_replace(mut self, domain: &str, failure: Failure) -> Self {
        self.replace_failures.insert(domain.to_string(), failure);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn cancelling_on_replace(mut self, tx: watch::Sender<bool>) -> Self {
        self.cancel_on_replace = Some(tx);
        self
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }

    pub fn replace_calls(&self) -> Vec<(String, Vec<RegistrarRecord>)> {
        self.replace_calls.lock().unwrap().clone()
    }

    /// Domains that received a replace call, deduplicated
    pub fn replaced_domains(&self) -> HashSet<String> {
        self.replace_calls().into_iter().map(|(d, _)| d).collect()
    }

    pub fn total_calls(&self) -> usize {
        self.fetch_calls().len() + self.replace_calls().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RegistryClient for RecordingClient {
    async fn fetch_all(&self, domain: &str) -> Result<Vec<RegistrarRecord>> {
        self.fetch_calls.lock().unwrap().push(domain.to_string());
        self.enter().await;
        let result = match self.fetch_failures.get(domain) {
            Some(failure) => Err(failure.to_error(domain)),
            None => self.store.fetch_all(domain).await,
        };
        self.leave();
        result
    }

    async fn replace_all(&self, domain: &str, records: &[RegistrarRecord]) -> Result<()> {
        self.replace_calls
            .lock()
            .unwrap()
            .push((domain.to_string(), records.to_vec()));
        if let Some(tx) = &self.cancel_on_replace {
            let _ = tx.send(true);
        }
        self.enter().await;
        let result = match self.replace_failures.get(domain) {
            Some(failure) => Err(failure.to_error(domain)),
            None => self.store.replace_all(domain, records).await,
        };
        self.leave();
        result
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Build a reconciler sharing `client` with the test
pub fn reconciler_for(client: &Arc<RecordingClient>, domains: &[&str]) -> Reconciler {
    Reconciler::with_filter(client.clone(), DomainFilter::new(domains))
}

pub fn a(name: &str, data: &str) -> RegistrarRecord {
    RegistrarRecord::new(name, "A", data, 600)
}

pub fn mx(name: &str, data: &str, priority: u32) -> RegistrarRecord {
    RegistrarRecord {
        priority: Some(priority),
        ..RegistrarRecord::new(name, "MX", data, 3600)
    }
}
