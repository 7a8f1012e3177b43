//! The three descriptor-mutating operations.
//!
//! Each operation works on an in-memory [`Descriptor`]; loading, writing
//! and validation belong to the caller. All of them leave the descriptor
//! sorted by name.

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::reconcile::{self, Registry};
use crate::types::{ResourceLimits, RestartPolicy, ServiceSpec};

/// What an add changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Services that did not exist before
    pub added: Vec<String>,
    /// Services whose previous definition was replaced
    pub replaced: Vec<String>,
}

/// What a remove changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveReport {
    /// Services deleted
    pub removed: Vec<String>,
    /// Requested names that were not present
    pub missing: Vec<String>,
    /// Networks deleted because nothing references them anymore
    pub pruned_networks: Vec<String>,
}

impl RemoveReport {
    /// Whether the descriptor was modified.
    pub fn changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Settings shared by every service of a batch build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRequest {
    /// `NAME:IMAGE` entries
    pub services: Vec<String>,
    /// Restart policy for every service
    pub restart: RestartPolicy,
    /// Network names, referenced as-is
    pub networks: Vec<String>,
    /// Port mappings
    pub ports: Vec<String>,
    /// Environment entries
    pub environment: Vec<String>,
    /// Volume bindings
    pub volumes: Vec<String>,
    /// Resource limits, already resolved from a preset
    pub limits: Option<ResourceLimits>,
}

/// Insert services, replacing any existing entry of the same name.
///
/// A replaced service keeps nothing from its previous definition. Network
/// requests go through the reconciler; networks are never garbage
/// collected here. All specs are checked before the descriptor is touched.
pub fn add(doc: &mut Descriptor, registry: &Registry, specs: Vec<ServiceSpec>) -> Result<AddReport> {
    for spec in &specs {
        check_name("service", &spec.name)?;
        if spec.image.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "service '{}' has no image",
                spec.name
            )));
        }
        for network in spec
            .networks
            .attach
            .iter()
            .chain(spec.networks.create.iter().map(|(n, _)| n))
        {
            check_name("network", network)?;
        }
    }

    let mut report = AddReport::default();
    for spec in specs {
        let networks = reconcile::attach(doc, registry, &spec.networks);
        let name = spec.name.clone();
        if doc.set_service(name.clone(), spec.into_service(networks)).is_some() {
            log::debug!("service '{name}' replaced");
            report.replaced.push(name);
        } else {
            log::debug!("service '{name}' added");
            report.added.push(name);
        }
    }

    doc.canonicalize();
    Ok(report)
}

/// Delete services and sweep networks left without references.
///
/// Names that are not present are reported, not treated as errors. When
/// nothing was deleted the descriptor is left exactly as it was.
pub fn remove(doc: &mut Descriptor, names: &[String]) -> RemoveReport {
    let mut report = RemoveReport::default();
    for name in names {
        if doc.remove_service(name).is_some() {
            report.removed.push(name.clone());
        } else {
            report.missing.push(name.clone());
        }
    }

    if report.changed() {
        report.pruned_networks = reconcile::collect_garbage(doc);
        doc.canonicalize();
    }
    report
}

/// Build a fresh descriptor from a batch request.
///
/// Nothing is read from disk: the result replaces whatever the target
/// file held. Networks are referenced by name only, without definitions.
pub fn build(request: &BuildRequest) -> Result<Descriptor> {
    for network in &request.networks {
        check_name("network", network)?;
    }

    let mut doc = Descriptor::new();
    for entry in &request.services {
        let (name, image) = split_service_entry(entry)?;
        let spec = ServiceSpec {
            restart: request.restart,
            ports: request.ports.clone(),
            volumes: request.volumes.clone(),
            environment: request.environment.clone(),
            limits: request.limits.clone(),
            ..ServiceSpec::new(name, image)
        };
        doc.set_service(name, spec.into_service(request.networks.clone()));
    }
    doc.canonicalize();
    Ok(doc)
}

/// Split a `NAME:IMAGE` entry at its first colon.
pub fn split_service_entry(entry: &str) -> Result<(&str, &str)> {
    let (name, image) = entry
        .split_once(':')
        .map(|(n, i)| (n.trim(), i.trim()))
        .filter(|(n, i)| !n.is_empty() && !i.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("'{entry}' is not in NAME:IMAGE form")))?;
    check_name("service", name)?;
    Ok((name, image))
}

/// Names must be usable as mapping keys and as compose identifiers.
fn check_name(kind: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && name.starts_with(|c: char| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{kind} name '{name}' must start with a letter or digit and contain only letters, digits, '-', '_' or '.'"
        )))
    }
}
