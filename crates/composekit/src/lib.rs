//! # composekit
//!
//! Library for generating and maintaining container-compose descriptors.
//!
//! This crate provides functionality for:
//! - Reading compose files into a structured [`Descriptor`]
//! - Writing descriptors in a canonical, deterministic layout
//! - Adding and removing services with network reconciliation
//! - Building a fresh descriptor from a batch of `NAME:IMAGE` entries
//! - Resolving named resource presets
//! - Validating written files through an external compose tool
//!
//! ## Example
//!
//! ```no_run
//! use composekit::{Registry, ServiceSpec, document, merge};
//! use std::path::Path;
//!
//! let registry = Registry::load(Path::new("infra.yml")).expect("no infra file");
//! let mut doc = document::parse_file(Path::new("web/compose.yml")).expect("unreadable");
//!
//! let spec = ServiceSpec::new("web", "nginx").attach("proxy").with_port("8080:80");
//! merge::add(&mut doc, &registry, vec![spec]).expect("invalid service");
//!
//! document::write_file(&doc, Path::new("web/compose.yml")).expect("write failed");
//! ```
//!
//! ## Networks
//!
//! Networks named in the shared-infrastructure file are written as external
//! references. Networks created for a service are bridges owned by the
//! descriptor, and are swept once no service uses them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod document;
pub mod error;
pub mod merge;
pub mod ordering;
pub mod presets;
pub mod reconcile;
pub mod types;
pub mod validator;

pub use descriptor::{Descriptor, NamedMap};
pub use error::{Error, ErrorCategory, Result};
pub use merge::{AddReport, BuildRequest, RemoveReport};
pub use presets::{Preset, PresetTable};
pub use reconcile::Registry;
pub use types::{
    AUTO_UPDATE_LABEL, Network, NetworkKind, NetworkRequest, ResourceLimits, RestartPolicy,
    Service, ServiceSpec,
};
pub use validator::{CommandValidator, Validator, Verdict};
