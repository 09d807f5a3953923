//! Conversions between registrar records and generic endpoints
//!
//! Both directions are pure. Names are copied verbatim; qualifying relative
//! registrar names against a domain is the reconciler's job.
//!
//! Type-specific fields travel on the endpoint as provider-specific
//! properties named by the constants below. The registrar only uses them on
//! MX (priority) and SRV (priority, weight, port, protocol, service), but any
//! field present on a record is carried so the conversion is lossless.

use crate::endpoint::Endpoint;
use crate::record::RegistrarRecord;
use tracing::warn;

pub const PROPERTY_PRIORITY: &str = "priority";
pub const PROPERTY_WEIGHT: &str = "weight";
pub const PROPERTY_PORT: &str = "port";
pub const PROPERTY_PROTOCOL: &str = "protocol";
pub const PROPERTY_SERVICE: &str = "service";

/// Convert one registrar record into a single-target endpoint
pub fn to_endpoint(record: &RegistrarRecord) -> Endpoint {
    let mut endpoint = Endpoint::new(&record.name, &record.record_type, [&record.data])
        .with_ttl(record.ttl);

    if let Some(priority) = record.priority {
        endpoint.set_property(PROPERTY_PRIORITY, priority.to_string());
    }
    if let Some(weight) = record.weight {
        endpoint.set_property(PROPERTY_WEIGHT, weight.to_string());
    }
    if let Some(port) = record.port {
        endpoint.set_property(PROPERTY_PORT, port.to_string());
    }
    if let Some(ref protocol) = record.protocol {
        endpoint.set_property(PROPERTY_PROTOCOL, protocol);
    }
    if let Some(ref service) = record.service {
        endpoint.set_property(PROPERTY_SERVICE, service);
    }

    endpoint
}

/// Fan an endpoint out into one registrar record per target
///
/// Every target shares the endpoint's TTL and type-specific fields.
pub fn to_registrar_records(endpoint: &Endpoint) -> Vec<RegistrarRecord> {
    let priority = numeric_property(endpoint, PROPERTY_PRIORITY);
    let weight = numeric_property(endpoint, PROPERTY_WEIGHT);
    let port = numeric_property(endpoint, PROPERTY_PORT);
    let protocol = endpoint.property(PROPERTY_PROTOCOL).map(str::to_string);
    let service = endpoint.property(PROPERTY_SERVICE).map(str::to_string);

    endpoint
        .targets
        .iter()
        .map(|target| RegistrarRecord {
            name: endpoint.dns_name.clone(),
            data: target.clone(),
            record_type: endpoint.record_type.clone(),
            ttl: endpoint.record_ttl,
            port,
            priority,
            protocol: protocol.clone(),
            service: service.clone(),
            weight,
        })
        .collect()
}

fn numeric_property(endpoint: &Endpoint, name: &str) -> Option<u32> {
    let raw = endpoint.property(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(
                "Ignoring non-numeric {} '{}' on {} {}",
                name, raw, endpoint.record_type, endpoint.dns_name
            );
            None
        }
    }
}
