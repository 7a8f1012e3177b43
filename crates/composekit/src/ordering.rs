//! Canonical field order for services and networks.
//!
//! Fields named in the canonical sequence are moved to their fixed
//! position; every other field follows in its prior relative order.
//! Applying an ordering twice gives the same result as applying it once.

/// Emission order for service fields.
pub const SERVICE_FIELD_ORDER: [&str; 10] = [
    "container_name",
    "image",
    "restart",
    "networks",
    "ports",
    "volumes",
    "environment",
    "depends_on",
    "labels",
    "deploy",
];

/// Emission order for network fields.
pub const NETWORK_FIELD_ORDER: [&str; 5] = ["name", "driver", "internal", "external", "enable_ipv6"];

/// Order `fields` according to `canonical`, appending unknown fields in
/// their original order. Duplicates are kept once.
pub fn order_fields<'a>(fields: &[&'a str], canonical: &[&str]) -> Vec<&'a str> {
    let mut ordered: Vec<&'a str> = Vec::with_capacity(fields.len());
    for key in canonical {
        if let Some(field) = fields.iter().find(|f| *f == key) {
            ordered.push(*field);
        }
    }
    for field in fields {
        if !canonical.contains(field) && !ordered.contains(field) {
            ordered.push(*field);
        }
    }
    ordered
}

/// Canonical order for a service's fields.
pub fn order_service_fields<'a>(fields: &[&'a str]) -> Vec<&'a str> {
    order_fields(fields, &SERVICE_FIELD_ORDER)
}

/// Canonical order for a network's fields.
pub fn order_network_fields<'a>(fields: &[&'a str]) -> Vec<&'a str> {
    order_fields(fields, &NETWORK_FIELD_ORDER)
}
