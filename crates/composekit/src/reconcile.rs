//! Network reconciliation against the shared-infrastructure file.
//!
//! Attaching a service to a network records the network in the descriptor
//! as either external (known to the registry) or managed (a bridge this
//! descriptor owns). Removing services sweeps networks nobody references.

use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::types::{Network, NetworkRequest};
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Skeleton written when the infrastructure file is created.
pub const INFRA_SKELETON: &str = "services: {}\nnetworks: {}\n";

/// Network names defined by the shared-infrastructure file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    networks: BTreeSet<String>,
}

impl Registry {
    /// Create a registry from a list of network names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            networks: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the network names from an infrastructure file.
    ///
    /// Only the top-level `networks` keys are read; services in the file
    /// are never interpreted.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::PreconditionMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let root: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        let networks = match root.get("networks") {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Mapping(map)) => map,
            Some(_) => return Err("top-level 'networks' must be a mapping".to_string()),
        };
        Ok(Self::new(networks.keys().filter_map(Value::as_str)))
    }

    /// Whether the registry defines the network.
    pub fn contains(&self, name: &str) -> bool {
        self.networks.contains(name)
    }

    /// Network names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.networks.iter().map(String::as_str)
    }
}

/// Create the infrastructure file with an empty skeleton, including parent
/// directories.
pub fn init_infra(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, INFRA_SKELETON)?;
    log::info!("initialized infrastructure file {}", path.display());
    Ok(())
}

/// Resolve a service's network request into descriptor entries.
///
/// Returns the network names for the service's `networks` field: existing
/// attachments first, then created networks, each in request order and
/// each at most once.
pub fn attach(doc: &mut Descriptor, registry: &Registry, request: &NetworkRequest) -> Vec<String> {
    let mut joined: Vec<String> = Vec::new();

    for name in &request.attach {
        if registry.contains(name) {
            log::debug!("network '{name}' found in registry, marking external");
            doc.set_network(name.clone(), Network::external(name.clone()));
        } else if doc.network(name).is_some() {
            log::debug!("network '{name}' already defined locally, leaving it as is");
        } else {
            log::debug!("network '{name}' unknown, defining managed bridge");
            doc.set_network(name.clone(), Network::bridge(name.clone()));
        }
        if !joined.contains(name) {
            joined.push(name.clone());
        }
    }

    for (name, kind) in &request.create {
        log::debug!("creating {kind} network '{name}'");
        doc.set_network(name.clone(), Network::of_kind(name.clone(), *kind));
        if !joined.contains(name) {
            joined.push(name.clone());
        }
    }

    joined
}

/// Delete every network no remaining service references.
///
/// Returns the removed network names in their previous order.
pub fn collect_garbage(doc: &mut Descriptor) -> Vec<String> {
    let referenced: BTreeSet<&str> = doc
        .services
        .iter()
        .flat_map(|(_, svc)| svc.networks.iter().map(String::as_str))
        .collect();

    let orphaned: Vec<String> = doc
        .networks
        .names()
        .filter(|name| !referenced.contains(name))
        .map(str::to_string)
        .collect();

    for name in &orphaned {
        log::debug!("network '{name}' no longer referenced, removing");
        doc.remove_network(name);
    }
    orphaned
}
