//! Core types for compose descriptors.

use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;

/// Tag appended to images given without one.
pub const DEFAULT_TAG: &str = "latest";

/// Label that opts a container into Watchtower automatic image updates.
pub const AUTO_UPDATE_LABEL: &str = "com.centurylinklabs.watchtower.enable=true";

/// Container restart policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RestartPolicy {
    /// Restart unless stopped manually
    #[default]
    UnlessStopped,
    /// Always restart on exit
    Always,
    /// Restart on non-zero exit
    OnFailure,
    /// Do not restart
    No,
}

impl RestartPolicy {
    /// All policies, in the order they are offered to operators.
    pub const ALL: [RestartPolicy; 4] = [
        RestartPolicy::UnlessStopped,
        RestartPolicy::Always,
        RestartPolicy::OnFailure,
        RestartPolicy::No,
    ];

    /// The value written to the `restart` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartPolicy::UnlessStopped => "unless-stopped",
            RestartPolicy::Always => "always",
            RestartPolicy::OnFailure => "on-failure",
            RestartPolicy::No => "no",
        }
    }

    /// Short explanation shown next to the policy in prompts.
    pub fn description(&self) -> &'static str {
        match self {
            RestartPolicy::UnlessStopped => "Restart unless stopped manually",
            RestartPolicy::Always => "Always restart on exit",
            RestartPolicy::OnFailure => "Restart on non-zero exit",
            RestartPolicy::No => "Do not restart",
        }
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RestartPolicy::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!("unknown restart policy '{s}' (expected unless-stopped, always, on-failure or no)")
            })
    }
}

/// CPU and memory limits applied under `deploy.resources.limits`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    /// CPU count, kept as text (e.g. "0.5")
    pub cpus: String,
    /// Memory limit (e.g. "128M")
    pub memory: String,
}

impl ResourceLimits {
    /// Create limits from a cpu/memory pair.
    pub fn new(cpus: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpus: cpus.into(),
            memory: memory.into(),
        }
    }
}

/// A service entry.
///
/// Only fields that are set are emitted. `extras` holds every field this
/// tool does not model, in the order it was read, plus modeled fields whose
/// shape does not fit the typed representation (a `deploy` with replicas,
/// long-syntax `depends_on`); those keep their canonical position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    /// Container name
    pub container_name: Option<String>,
    /// Image reference
    pub image: Option<String>,
    /// Restart policy
    pub restart: Option<RestartPolicy>,
    /// Network references, in attachment order
    pub networks: Vec<String>,
    /// Port mappings (`host:container[/proto]`)
    pub ports: Vec<String>,
    /// Volume bindings (`host:container`)
    pub volumes: Vec<String>,
    /// Environment (`KEY=VALUE`)
    pub environment: Vec<String>,
    /// Service dependencies
    pub depends_on: Vec<String>,
    /// Labels (`key=value`)
    pub labels: Vec<String>,
    /// Limits emitted as `deploy.resources.limits`
    pub resource_limits: Option<ResourceLimits>,
    /// Unrecognized fields
    pub extras: Mapping,
    /// Free-text notes rendered as comments under the service header
    pub annotations: Vec<String>,
}

impl Service {
    /// Names of the fields currently set: modeled fields first, then extras
    /// in their stored order.
    pub fn present_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        if self.container_name.is_some() {
            fields.push("container_name");
        }
        if self.image.is_some() {
            fields.push("image");
        }
        if self.restart.is_some() {
            fields.push("restart");
        }
        for (name, list) in self.lists() {
            if !list.is_empty() {
                fields.push(name);
            }
        }
        if self.resource_limits.is_some() {
            fields.push("deploy");
        }
        for key in self.extras.keys().filter_map(Value::as_str) {
            if !fields.contains(&key) {
                fields.push(key);
            }
        }
        fields
    }

    /// The sequence-valued fields, by name.
    pub fn lists(&self) -> [(&'static str, &Vec<String>); 6] {
        [
            ("networks", &self.networks),
            ("ports", &self.ports),
            ("volumes", &self.volumes),
            ("environment", &self.environment),
            ("depends_on", &self.depends_on),
            ("labels", &self.labels),
        ]
    }

    /// Whether the service carries the Watchtower opt-in label.
    pub fn auto_updates(&self) -> bool {
        self.labels.iter().any(|l| l == AUTO_UPDATE_LABEL)
    }
}

/// Kind requested for a newly created network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkKind {
    /// Defined elsewhere, referenced as external
    External,
    /// Isolated bridge without outbound access
    Internal,
    /// IPv6-enabled bridge
    Internet,
}

impl NetworkKind {
    /// All kinds, in the order they are offered to operators.
    pub const ALL: [NetworkKind; 3] = [
        NetworkKind::External,
        NetworkKind::Internal,
        NetworkKind::Internet,
    ];

    /// Lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::External => "external",
            NetworkKind::Internal => "internal",
            NetworkKind::Internet => "internet",
        }
    }

    /// Short explanation shown next to the kind in prompts.
    pub fn description(&self) -> &'static str {
        match self {
            NetworkKind::External => "external bridge network",
            NetworkKind::Internal => "isolated internal network",
            NetworkKind::Internet => "IPv6-enabled bridged network",
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetworkKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("unknown network kind '{s}'"))
    }
}

/// A network entry.
///
/// `external` and `driver` never coexist: setting one clears the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    name: Option<String>,
    driver: Option<String>,
    internal: Option<bool>,
    external: Option<bool>,
    enable_ipv6: Option<bool>,
    extras: Mapping,
}

impl Network {
    /// Driver used for networks this tool creates.
    pub const MANAGED_DRIVER: &'static str = "bridge";

    /// A reference to a network defined outside this descriptor.
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            external: Some(true),
            ..Default::default()
        }
    }

    /// A plain bridge network owned by this descriptor.
    pub fn bridge(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            driver: Some(Self::MANAGED_DRIVER.to_string()),
            ..Default::default()
        }
    }

    /// A newly created network of the requested kind.
    pub fn of_kind(name: impl Into<String>, kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::External => Self::external(name),
            NetworkKind::Internal => Self {
                internal: Some(true),
                ..Self::bridge(name)
            },
            NetworkKind::Internet => Self {
                enable_ipv6: Some(true),
                ..Self::bridge(name)
            },
        }
    }

    /// The `name` field.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The `driver` field.
    pub fn driver(&self) -> Option<&str> {
        self.driver.as_deref()
    }

    /// The `internal` field.
    pub fn internal(&self) -> Option<bool> {
        self.internal
    }

    /// The `external` field.
    pub fn external_flag(&self) -> Option<bool> {
        self.external
    }

    /// The `enable_ipv6` field.
    pub fn enable_ipv6(&self) -> Option<bool> {
        self.enable_ipv6
    }

    /// Unrecognized fields.
    pub fn extras(&self) -> &Mapping {
        &self.extras
    }

    /// Whether the network is marked external.
    pub fn is_external(&self) -> bool {
        self.external == Some(true)
    }

    /// Set the `name` field.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Set the driver. A driver makes the network managed, so `external`
    /// is cleared.
    pub fn set_driver(&mut self, driver: Option<String>) {
        if driver.is_some() {
            self.external = None;
        }
        self.driver = driver;
    }

    /// Set the `external` field. Marking a network external clears its
    /// driver.
    pub fn set_external(&mut self, external: Option<bool>) {
        if external == Some(true) {
            self.driver = None;
        }
        self.external = external;
    }

    /// Set the `internal` field.
    pub fn set_internal(&mut self, internal: Option<bool>) {
        self.internal = internal;
    }

    /// Set the `enable_ipv6` field.
    pub fn set_enable_ipv6(&mut self, enable_ipv6: Option<bool>) {
        self.enable_ipv6 = enable_ipv6;
    }

    /// Replace the unrecognized fields.
    pub fn set_extras(&mut self, extras: Mapping) {
        self.extras = extras;
    }

    /// Names of the fields currently set, modeled fields first.
    pub fn present_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.driver.is_some() {
            fields.push("driver");
        }
        if self.internal.is_some() {
            fields.push("internal");
        }
        if self.external.is_some() {
            fields.push("external");
        }
        if self.enable_ipv6.is_some() {
            fields.push("enable_ipv6");
        }
        for key in self.extras.keys().filter_map(Value::as_str) {
            if !fields.contains(&key) {
                fields.push(key);
            }
        }
        fields
    }
}

/// Networks a service asks to join.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkRequest {
    /// Names of networks that already exist (registry or local)
    pub attach: Vec<String>,
    /// Networks to create, with the requested kind
    pub create: Vec<(String, NetworkKind)>,
}

/// Structured input describing one service to add.
///
/// Produced by an input collector (wizard or flags) and consumed by the
/// merge engine; nothing here touches a terminal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceSpec {
    /// Key in the services mapping
    pub name: String,
    /// Container name (defaults to `name` when empty)
    pub container_name: String,
    /// Image, tag optional
    pub image: String,
    /// Restart policy
    pub restart: RestartPolicy,
    /// Network attachments and creations
    pub networks: NetworkRequest,
    /// Port mappings
    pub ports: Vec<String>,
    /// Volume bindings
    pub volumes: Vec<String>,
    /// Environment entries
    pub environment: Vec<String>,
    /// Service dependencies
    pub depends_on: Vec<String>,
    /// Labels
    pub labels: Vec<String>,
    /// Resource limits
    pub limits: Option<ResourceLimits>,
    /// Free-text notes
    pub annotations: Vec<String>,
}

impl ServiceSpec {
    /// Create a spec with a name and image; everything else defaulted.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            container_name: name.clone(),
            name,
            image: image.into(),
            ..Default::default()
        }
    }

    /// Attach to an existing network.
    pub fn attach(mut self, network: impl Into<String>) -> Self {
        self.networks.attach.push(network.into());
        self
    }

    /// Create a network of the given kind.
    pub fn create(mut self, network: impl Into<String>, kind: NetworkKind) -> Self {
        self.networks.create.push((network.into(), kind));
        self
    }

    /// Add a port mapping.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.ports.push(port.into());
        self
    }

    /// Set annotations from a comma-separated note string.
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.annotations = split_list(notes);
        self
    }

    /// Turn the spec into a service joined to the given networks.
    pub fn into_service(self, networks: Vec<String>) -> Service {
        let container_name = if self.container_name.is_empty() {
            self.name
        } else {
            self.container_name
        };
        Service {
            container_name: Some(container_name),
            image: Some(normalize_image(&self.image)),
            restart: Some(self.restart),
            networks,
            ports: self.ports,
            volumes: self.volumes,
            environment: self.environment,
            depends_on: self.depends_on,
            labels: self.labels,
            resource_limits: self.limits,
            extras: Mapping::new(),
            annotations: self.annotations,
        }
    }
}

/// Append the default tag to an image reference that has none.
///
/// A colon only counts as a tag separator in the last path segment, so
/// registry ports (`host:5000/app`) are not mistaken for tags. Digest
/// references are left alone.
pub fn normalize_image(image: &str) -> String {
    let image = image.trim();
    if image.is_empty() || is_tagged(image) {
        image.to_string()
    } else {
        format!("{}:{DEFAULT_TAG}", image.strip_suffix(':').unwrap_or(image))
    }
}

/// Whether an image reference names a tag or digest.
///
/// A trailing colon with nothing after it is not a tag.
pub fn is_tagged(image: &str) -> bool {
    if image.contains('@') {
        return true;
    }
    image
        .rsplit('/')
        .next()
        .and_then(|last| last.rsplit_once(':'))
        .is_some_and(|(_, tag)| !tag.is_empty())
}

/// Split a comma-separated operator answer, trimming and dropping blanks.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_image_adds_latest() {
        assert_eq!(normalize_image("nginx"), "nginx:latest");
        assert_eq!(normalize_image("library/nginx"), "library/nginx:latest");
    }

    #[test]
    fn test_normalize_image_keeps_existing_tag() {
        assert_eq!(normalize_image("nginx:1.25"), "nginx:1.25");
        assert_eq!(
            normalize_image("registry.local:5000/team/app"),
            "registry.local:5000/team/app:latest"
        );
        assert_eq!(
            normalize_image("registry.local:5000/team/app:v2"),
            "registry.local:5000/team/app:v2"
        );
        assert_eq!(normalize_image("app@sha256:abcd"), "app@sha256:abcd");
    }

    #[test]
    fn test_empty_tag_is_untagged() {
        assert!(!is_tagged("nginx:"));
        assert!(!is_tagged("registry.local:5000/app:"));
        assert_eq!(normalize_image("nginx:"), "nginx:latest");
        assert_eq!(
            normalize_image("registry.local:5000/app:"),
            "registry.local:5000/app:latest"
        );
    }

    #[test]
    fn test_network_kinds() {
        let internal = Network::of_kind("backend", NetworkKind::Internal);
        assert_eq!(internal.driver(), Some("bridge"));
        assert_eq!(internal.internal(), Some(true));
        assert!(!internal.is_external());

        let internet = Network::of_kind("edge", NetworkKind::Internet);
        assert_eq!(internet.driver(), Some("bridge"));
        assert_eq!(internet.enable_ipv6(), Some(true));

        let external = Network::of_kind("proxy", NetworkKind::External);
        assert!(external.is_external());
        assert_eq!(external.driver(), None);
        assert_eq!(external.present_fields(), vec!["name", "external"]);
    }

    #[test]
    fn test_external_and_driver_are_exclusive() {
        let mut net = Network::bridge("backend");
        net.set_external(Some(true));
        assert_eq!(net.driver(), None);

        net.set_driver(Some("overlay".into()));
        assert_eq!(net.external_flag(), None);
        assert_eq!(net.driver(), Some("overlay"));
    }

    #[test]
    fn test_spec_into_service() {
        let service = ServiceSpec::new("web", "nginx")
            .with_port("8080:80")
            .with_notes("public site, , behind proxy ")
            .into_service(vec!["proxy".into()]);

        assert_eq!(service.container_name.as_deref(), Some("web"));
        assert_eq!(service.image.as_deref(), Some("nginx:latest"));
        assert_eq!(service.restart, Some(RestartPolicy::UnlessStopped));
        assert_eq!(service.annotations, vec!["public site", "behind proxy"]);
        assert_eq!(
            service.present_fields(),
            vec!["container_name", "image", "restart", "networks", "ports"]
        );
    }

    #[test]
    fn test_restart_policy_parse() {
        assert_eq!("on-failure".parse(), Ok(RestartPolicy::OnFailure));
        assert!("sometimes".parse::<RestartPolicy>().is_err());
    }
}
