//! Architectural Contract Test: Cancellation And Concurrency
//!
//! Constraints verified:
//! - Domains are processed concurrently, bounded by configuration
//! - Cancellation before the pass starts contacts nobody
//! - Cancellation stops new domains from starting
//! - A replace already in flight runs to completion
//! - Cancelled domains are reported, never silently treated as success
//!
//! If this test fails, shutdown can truncate a submission or hide skipped work.

mod common;

use common::*;
use extdns_core::{ChangeSet, DomainOperation, Endpoint, Error, MemoryRegistryClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn one_create_per_domain(domains: &[&str]) -> ChangeSet {
    domains.iter().fold(ChangeSet::new(), |changes, domain| {
        changes.with_create(Endpoint::new(format!("api.{}", domain), "A", ["10.0.0.1"]))
    })
}

#[tokio::test]
async fn domains_run_concurrently() {
    let client = Arc::new(
        RecordingClient::new(MemoryRegistryClient::new()).with_delay(Duration::from_millis(50)),
    );
    let reconciler = reconciler_for(&client, &["a.com", "b.com", "c.com"]).with_max_concurrent_domains(3);

    reconciler
        .apply(one_create_per_domain(&["a.com", "b.com", "c.com"]))
        .await
        .unwrap();

    assert!(
        client.max_in_flight() >= 2,
        "expected overlapping domain work, max in flight was {}",
        client.max_in_flight()
    );
    assert_eq!(client.replaced_domains().len(), 3);
}

#[tokio::test]
async fn concurrency_bound_is_respected() {
    let client = Arc::new(
        RecordingClient::new(MemoryRegistryClient::new()).with_delay(Duration::from_millis(10)),
    );
    let reconciler = reconciler_for(&client, &["a.com", "b.com", "c.com"]).with_max_concurrent_domains(1);

    reconciler
        .apply(one_create_per_domain(&["a.com", "b.com", "c.com"]))
        .await
        .unwrap();

    assert_eq!(client.max_in_flight(), 1);
}

#[tokio::test]
async fn cancelled_before_start_contacts_nobody() {
    let client = Arc::new(RecordingClient::new(MemoryRegistryClient::new()));
    let reconciler = reconciler_for(&client, &["a.com", "b.com"]);

    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let err = reconciler
        .apply_with_shutdown(one_create_per_domain(&["a.com", "b.com"]), Some(rx))
        .await
        .unwrap_err();

    assert_eq!(client.total_calls(), 0);
    match err {
        Error::Apply(failures) => {
            assert_eq!(failures.domains(), vec!["a.com", "b.com"]);
            assert!(failures
                .iter()
                .all(|f| f.operation == DomainOperation::Start && matches!(f.error, Error::Cancelled(_))));
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
}

#[tokio::test]
async fn in_flight_replace_completes_and_later_domains_do_not_start() {
    let (tx, rx) = watch::channel(false);
    let client = Arc::new(
        RecordingClient::new(MemoryRegistryClient::new())
            .with_delay(Duration::from_millis(20))
            .cancelling_on_replace(tx),
    );
    // One domain at a time, in name order
    let reconciler = reconciler_for(&client, &["a.com", "b.com"]).with_max_concurrent_domains(1);

    let err = reconciler
        .apply_with_shutdown(one_create_per_domain(&["a.com", "b.com"]), Some(rx))
        .await
        .unwrap_err();

    // a.com's replace flipped the signal and still landed
    assert_eq!(client.store.records("a.com").await.map(|r| r.len()), Some(1));
    assert_eq!(client.fetch_calls(), vec!["a.com".to_string()]);

    match err {
        Error::Apply(failures) => {
            assert_eq!(failures.domains(), vec!["b.com"]);
            assert!(matches!(
                failures.iter().next().unwrap().error,
                Error::Cancelled(_)
            ));
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
}
