//! Change planning and record merging
//!
//! Everything here is synchronous and side-effect free apart from logging:
//! splitting a change set by managed domain, and computing the full record
//! list a domain should hold once the changes are applied.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::codec;
use crate::domain_filter::{DomainFilter, is_within, normalize_name};
use crate::endpoint::{ChangeSet, Endpoint};
use crate::record::RegistrarRecord;

/// The slice of a change set that belongs to one managed domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainChanges {
    pub create: Vec<Endpoint>,
    pub update: Vec<Endpoint>,
    pub delete: Vec<Endpoint>,
}

impl DomainChanges {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// A change set split by managed domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePlan {
    /// Per-domain changes, keyed by managed root domain
    pub domains: BTreeMap<String, DomainChanges>,
    /// Endpoints dropped because they fall outside the managed domains
    pub dropped: usize,
}

#[derive(Clone, Copy)]
enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangePlan {
    /// Route every endpoint of `changes` to the domain that holds it
    ///
    /// Endpoints outside the filter, or whose domain cannot be determined,
    /// are dropped with a warning. They are never an error.
    pub fn build(filter: &DomainFilter, changes: ChangeSet) -> Self {
        let mut plan = ChangePlan::default();

        let lists = [
            (ChangeKind::Create, changes.create),
            (ChangeKind::Update, changes.update),
            (ChangeKind::Delete, changes.delete),
        ];

        for (kind, endpoints) in lists {
            for endpoint in endpoints {
                if !filter.matches(&endpoint.dns_name) {
                    warn!("Omitting change outside managed domains: {}", endpoint);
                    plan.dropped += 1;
                    continue;
                }

                let Some(domain) = filter.zone_for(&endpoint.dns_name) else {
                    warn!("Omitting change with no resolvable domain: {}", endpoint);
                    plan.dropped += 1;
                    continue;
                };

                let entry = plan.domains.entry(domain).or_default();
                match kind {
                    ChangeKind::Create => entry.create.push(endpoint),
                    ChangeKind::Update => entry.update.push(endpoint),
                    ChangeKind::Delete => entry.delete.push(endpoint),
                }
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Qualify a registrar record name against its domain
///
/// `@` and the empty name denote the apex. Names already inside the domain
/// are kept; anything else is treated as relative.
pub fn qualify(name: &str, domain: &str) -> String {
    let name = normalize_name(name);
    let domain = normalize_name(domain);

    if name.is_empty() || name == "@" {
        return domain;
    }
    if is_within(&name, &domain) {
        return name;
    }
    format!("{}.{}", name, domain)
}

fn key(name: &str, record_type: &str, domain: &str) -> (String, String) {
    (qualify(name, domain), record_type.to_ascii_uppercase())
}

/// Compute the full record list `domain` should hold after `changes`
///
/// Starting from `current`, every record whose (name, type) matches a delete
/// or an update is removed, then the records of every update and create are
/// appended. Records under other (name, type) keys are kept untouched: the
/// snapshot holds everything in the domain, managed or not.
///
/// A record with the same qualified name, type and value as one already in
/// the list is not appended twice. If its TTL or type-specific fields differ
/// it takes the existing record's place.
pub fn merge_records(
    domain: &str,
    current: &[RegistrarRecord],
    changes: &DomainChanges,
) -> Vec<RegistrarRecord> {
    for record in current {
        debug!("CURRENT: {}", record);
    }
    for ep in &changes.create {
        debug!("CREATE: {}", ep);
    }
    for ep in &changes.update {
        debug!("UPDATE: {}", ep);
    }
    for ep in &changes.delete {
        debug!("DELETE: {}", ep);
    }

    let replaced: HashSet<(String, String)> = changes
        .delete
        .iter()
        .chain(&changes.update)
        .map(|ep| key(&ep.dns_name, &ep.record_type, domain))
        .collect();

    let mut merged: Vec<RegistrarRecord> = current
        .iter()
        .filter(|r| !replaced.contains(&key(&r.name, &r.record_type, domain)))
        .cloned()
        .collect();

    let mut present: HashMap<(String, String, String), usize> = merged
        .iter()
        .enumerate()
        .map(|(index, r)| (value_key(r, domain), index))
        .collect();

    for endpoint in changes.update.iter().chain(&changes.create) {
        if endpoint.targets.is_empty() {
            warn!("Endpoint has no targets, nothing to write: {}", endpoint);
            continue;
        }

        for record in codec::to_registrar_records(endpoint) {
            let value = value_key(&record, domain);
            match present.get(&value).copied() {
                Some(index) if same_apart_from_name(&merged[index], &record) => {
                    debug!("Skipping duplicate record: {}", record);
                }
                Some(index) => {
                    debug!("Replacing {} with {}", merged[index], record);
                    merged[index] = record;
                }
                None => {
                    present.insert(value, merged.len());
                    merged.push(record);
                }
            }
        }
    }

    merged
}

/// (qualified name, TYPE, value): at most one record per key is kept
fn value_key(record: &RegistrarRecord, domain: &str) -> (String, String, String) {
    let (name, record_type) = key(&record.name, &record.record_type, domain);
    (name, record_type, record.data.clone())
}

/// TTL and type-specific fields agree; names are compared through `value_key`
fn same_apart_from_name(a: &RegistrarRecord, b: &RegistrarRecord) -> bool {
    a.ttl == b.ttl
        && a.priority == b.priority
        && a.weight == b.weight
        && a.port == b.port
        && a.protocol == b.protocol
        && a.service == b.service
}

/// Whether two record lists hold the same records, ignoring order
pub fn same_records(a: &[RegistrarRecord], b: &[RegistrarRecord]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(name: &str, data: &str) -> RegistrarRecord {
        RegistrarRecord::new(name, "A", data, 600)
    }

    #[test]
    fn qualify_relative_and_absolute_names() {
        assert_eq!(qualify("www", "example.com"), "www.example.com");
        assert_eq!(qualify("@", "example.com"), "example.com");
        assert_eq!(qualify("", "example.com"), "example.com");
        assert_eq!(qualify("WWW.Example.com.", "example.com"), "www.example.com");
        assert_eq!(qualify("example.com", "example.com"), "example.com");
    }

    #[test]
    fn plan_routes_endpoints_to_their_domain() {
        let filter = DomainFilter::new(["example.com", "example.org"]);
        let changes = ChangeSet::new()
            .with_create(Endpoint::new("api.example.com", "A", ["10.0.0.1"]))
            .with_update(Endpoint::new("www.example.org", "CNAME", ["example.org"]))
            .with_delete(Endpoint::new("old.example.com", "A", ["10.0.0.2"]))
            .with_delete(Endpoint::new("www.evil.com", "A", ["6.6.6.6"]));

        let plan = ChangePlan::build(&filter, changes);

        assert_eq!(plan.dropped, 1);
        assert_eq!(plan.domains.len(), 2);
        assert_eq!(plan.domains["example.com"].create.len(), 1);
        assert_eq!(plan.domains["example.com"].delete.len(), 1);
        assert_eq!(plan.domains["example.org"].update.len(), 1);
    }

    #[test]
    fn plan_drops_everything_outside_filter() {
        let filter = DomainFilter::new(["example.com"]);
        let changes = ChangeSet::new()
            .with_create(Endpoint::new("example.com.evil.com", "A", ["1.1.1.1"]))
            .with_delete(Endpoint::new("notexample.com", "A", ["1.1.1.1"]));

        let plan = ChangePlan::build(&filter, changes);
        assert!(plan.is_empty());
        assert_eq!(plan.dropped, 2);
    }

    #[test]
    fn delete_keeps_unrelated_records() {
        let current = vec![
            a("www.example.com", "1.2.3.4"),
            RegistrarRecord::new("mail.example.com", "MX", "mx.example.com", 3600),
        ];
        let changes = DomainChanges {
            delete: vec![Endpoint::new("www.example.com", "A", ["1.2.3.4"])],
            ..Default::default()
        };

        let merged = merge_records("example.com", &current, &changes);
        assert_eq!(merged, vec![current[1].clone()]);
    }

    #[test]
    fn delete_matches_relative_snapshot_names() {
        let current = vec![a("www", "1.2.3.4"), a("@", "1.2.3.5")];
        let changes = DomainChanges {
            delete: vec![Endpoint::new("www.example.com", "A", Vec::<String>::new())],
            ..Default::default()
        };

        let merged = merge_records("example.com", &current, &changes);
        assert_eq!(merged, vec![a("@", "1.2.3.5")]);
    }

    #[test]
    fn delete_only_removes_matching_type() {
        let current = vec![
            a("www.example.com", "1.2.3.4"),
            RegistrarRecord::new("www.example.com", "TXT", "owner=me", 600),
        ];
        let changes = DomainChanges {
            delete: vec![Endpoint::new("www.example.com", "a", ["1.2.3.4"])],
            ..Default::default()
        };

        let merged = merge_records("example.com", &current, &changes);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].record_type, "TXT");
    }

    #[test]
    fn update_replaces_all_values_for_key() {
        let current = vec![
            a("www.example.com", "1.1.1.1"),
            a("www.example.com", "2.2.2.2"),
            a("api.example.com", "3.3.3.3"),
        ];
        let changes = DomainChanges {
            update: vec![Endpoint::new("www.example.com", "A", ["9.9.9.9"]).with_ttl(300)],
            ..Default::default()
        };

        let merged = merge_records("example.com", &current, &changes);
        assert_eq!(
            merged,
            vec![
                a("api.example.com", "3.3.3.3"),
                RegistrarRecord::new("www.example.com", "A", "9.9.9.9", 300),
            ]
        );
    }

    #[test]
    fn create_into_empty_domain() {
        let changes = DomainChanges {
            create: vec![Endpoint::new("api.example.com", "A", ["10.0.0.1"]).with_ttl(600)],
            ..Default::default()
        };

        let merged = merge_records("example.com", &[], &changes);
        assert_eq!(merged, vec![RegistrarRecord::new("api.example.com", "A", "10.0.0.1", 600)]);
    }

    #[test]
    fn create_of_existing_value_is_not_duplicated() {
        let current = vec![a("www", "1.2.3.4")];
        let changes = DomainChanges {
            create: vec![Endpoint::new("www.example.com", "A", ["1.2.3.4", "5.6.7.8"]).with_ttl(600)],
            ..Default::default()
        };

        let merged = merge_records("example.com", &current, &changes);
        assert_eq!(merged, vec![a("www", "1.2.3.4"), a("www.example.com", "5.6.7.8")]);
    }

    #[test]
    fn create_of_existing_value_with_new_ttl_replaces_it() {
        let current = vec![a("www.example.com", "1.2.3.4"), a("api", "5.6.7.8")];
        let changes = DomainChanges {
            create: vec![Endpoint::new("www.example.com", "A", ["1.2.3.4"]).with_ttl(60)],
            ..Default::default()
        };

        let merged = merge_records("example.com", &current, &changes);
        assert_eq!(
            merged,
            vec![
                RegistrarRecord::new("www.example.com", "A", "1.2.3.4", 60),
                a("api", "5.6.7.8"),
            ]
        );
        assert!(!same_records(&current, &merged));
    }

    #[test]
    fn create_of_existing_mx_with_new_priority_replaces_it() {
        let current = vec![RegistrarRecord {
            priority: Some(10),
            ..RegistrarRecord::new("@", "MX", "mx.example.com", 3600)
        }];
        let changes = DomainChanges {
            create: vec![
                Endpoint::new("example.com", "MX", ["mx.example.com"])
                    .with_ttl(3600)
                    .with_property(codec::PROPERTY_PRIORITY, "20"),
            ],
            ..Default::default()
        };

        let merged = merge_records("example.com", &current, &changes);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].priority, Some(20));
    }

    #[test]
    fn same_records_ignores_order() {
        let x = vec![a("a", "1"), a("b", "2")];
        let y = vec![a("b", "2"), a("a", "1")];
        assert!(same_records(&x, &y));
        assert!(!same_records(&x, &x[..1]));
    }
}
