//! Parser for descriptor text.
//!
//! Modeled fields are read into their typed slots. A modeled field whose
//! shape does not fit (long-syntax `depends_on`, a `deploy` with more than
//! limits, `restart: on-failure:3`) is kept verbatim in the service's
//! extras so nothing is lost on rewrite. Top-level keys other than
//! `services` and `networks` are not carried over.

use crate::descriptor::Descriptor;
use crate::document::annotate;
use crate::error::{Error, Result};
use crate::types::{Network, ResourceLimits, Service};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Parse a descriptor file. A missing or empty file yields an empty
/// descriptor.
pub fn parse_file(path: &Path) -> Result<Descriptor> {
    if !path.exists() {
        return Ok(Descriptor::new());
    }
    let content = std::fs::read_to_string(path)?;
    parse_with_origin(&content, path)
}

/// Parse a descriptor from a string.
pub fn parse_string(content: &str) -> Result<Descriptor> {
    parse_with_origin(content, Path::new(""))
}

fn parse_with_origin(content: &str, origin: &Path) -> Result<Descriptor> {
    let parse_error = |message: String| Error::Parse {
        path: origin.to_path_buf(),
        message,
    };

    if content.trim().is_empty() {
        return Ok(Descriptor::new());
    }
    let root: Value = serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
    let root = match root {
        Value::Null => return Ok(Descriptor::new()),
        Value::Mapping(map) => map,
        _ => return Err(parse_error("top level must be a mapping".to_string())),
    };

    let mut doc = Descriptor::new();

    match root.get("services") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(services)) => {
            for (key, value) in services {
                let name = key
                    .as_str()
                    .ok_or_else(|| parse_error(format!("service name {key:?} is not a string")))?;
                let service = parse_service(name, value)
                    .map_err(|e| match e {
                        Error::Parse { message, .. } => parse_error(message),
                        other => other,
                    })?;
                doc.set_service(name, service);
            }
        }
        Some(_) => return Err(parse_error("'services' must be a mapping".to_string())),
    }

    match root.get("networks") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(networks)) => {
            for (key, value) in networks {
                let name = key
                    .as_str()
                    .ok_or_else(|| parse_error(format!("network name {key:?} is not a string")))?;
                let network = parse_network(name, value)
                    .ok_or_else(|| parse_error(format!("network '{name}' must be a mapping")))?;
                doc.set_network(name, network);
            }
        }
        Some(_) => return Err(parse_error("'networks' must be a mapping".to_string())),
    }

    for (name, notes) in annotate::recover(content) {
        if let Some(service) = doc.services.get_mut(&name) {
            service.annotations = notes;
        }
    }

    Ok(doc)
}

fn parse_service(name: &str, value: &Value) -> Result<Service> {
    let map = match value {
        Value::Null => return Ok(Service::default()),
        Value::Mapping(map) => map,
        _ => {
            return Err(Error::Parse {
                path: Default::default(),
                message: format!("service '{name}' must be a mapping"),
            });
        }
    };

    let mut service = Service::default();
    for (key, value) in map {
        let taken = match key.as_str() {
            Some("container_name") => {
                service.container_name = scalar(value);
                service.container_name.is_some()
            }
            Some("image") => {
                service.image = scalar(value);
                service.image.is_some()
            }
            Some("restart") => {
                service.restart = value.as_str().and_then(|s| s.parse().ok());
                service.restart.is_some()
            }
            Some("networks") => {
                service.networks = network_refs(value).ok_or_else(|| {
                    Error::field(
                        name,
                        "networks",
                        "uses per-network options, which this tool cannot rewrite safely",
                    )
                })?;
                true
            }
            Some("ports") => fill(&mut service.ports, string_list(value)),
            Some("volumes") => fill(&mut service.volumes, string_list(value)),
            Some("depends_on") => fill(&mut service.depends_on, string_list(value)),
            Some("environment") => fill(&mut service.environment, key_value_list(value)),
            Some("labels") => fill(&mut service.labels, key_value_list(value)),
            Some("deploy") => {
                service.resource_limits = limits(value);
                service.resource_limits.is_some()
            }
            _ => false,
        };
        if !taken {
            service.extras.insert(key.clone(), value.clone());
        }
    }
    Ok(service)
}

fn parse_network(name: &str, value: &Value) -> Option<Network> {
    let map = match value {
        Value::Null => return Some(Network::default()),
        Value::Mapping(map) => map,
        _ => return None,
    };

    let mut network = Network::default();
    let mut extras = Mapping::new();
    let mut driver = None;
    let mut external = None;

    for (key, value) in map {
        let taken = match (key.as_str(), value) {
            (Some("name"), _) => {
                let field = scalar(value);
                let taken = field.is_some();
                network.set_name(field);
                taken
            }
            (Some("driver"), Value::String(s)) => {
                driver = Some(s.clone());
                true
            }
            (Some("internal"), Value::Bool(b)) => {
                network.set_internal(Some(*b));
                true
            }
            (Some("external"), Value::Bool(b)) => {
                external = Some(*b);
                true
            }
            (Some("enable_ipv6"), Value::Bool(b)) => {
                network.set_enable_ipv6(Some(*b));
                true
            }
            _ => false,
        };
        if !taken {
            extras.insert(key.clone(), value.clone());
        }
    }

    if external == Some(true) && driver.is_some() {
        log::warn!("network '{name}' is marked external and has a driver; dropping the driver");
    }
    network.set_driver(driver);
    network.set_external(external);
    network.set_extras(extras);
    Some(network)
}

fn fill(slot: &mut Vec<String>, parsed: Option<Vec<String>>) -> bool {
    match parsed {
        Some(items) => {
            *slot = items;
            true
        }
        None => false,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_sequence()?.iter().map(scalar).collect()
}

/// A sequence of `KEY=VALUE` scalars, or a mapping converted to that form.
fn key_value_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Sequence(_) => string_list(value),
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| {
                let key = scalar(k)?;
                match v {
                    Value::Null => Some(key),
                    other => scalar(other).map(|val| format!("{key}={val}")),
                }
            })
            .collect(),
        _ => None,
    }
}

/// Network references: a list of names, or a mapping whose values carry
/// no options.
fn network_refs(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Sequence(_) => string_list(value),
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| match v {
                Value::Null => k.as_str().map(str::to_string),
                Value::Mapping(opts) if opts.is_empty() => k.as_str().map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// `deploy` holding exactly `resources.limits.{cpus, memory}`.
fn limits(value: &Value) -> Option<ResourceLimits> {
    let deploy = value.as_mapping().filter(|m| m.len() == 1)?;
    let resources = deploy.get("resources")?.as_mapping().filter(|m| m.len() == 1)?;
    let limits = resources.get("limits")?.as_mapping().filter(|m| m.len() == 2)?;
    Some(ResourceLimits::new(
        scalar(limits.get("cpus")?)?,
        scalar(limits.get("memory")?)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::writer::write_string;
    use crate::types::RestartPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_parse_missing_and_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compose.yml");
        assert!(parse_file(&path).unwrap().is_empty());

        std::fs::write(&path, "\n").unwrap();
        assert!(parse_file(&path).unwrap().is_empty());

        assert!(parse_string("services: {}\nnetworks: {}\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_service_fields() {
        let doc = parse_string(
            r#"services:
  web:
    image: nginx:1.25
    container_name: web
    restart: always
    ports:
      - "8080:80"
      - 443
    environment:
      TZ: Etc/UTC
      DEBUG:
    deploy:
      resources:
        limits:
          cpus: 0.5
          memory: 128M
"#,
        )
        .unwrap();

        let web = doc.service("web").unwrap();
        assert_eq!(web.image.as_deref(), Some("nginx:1.25"));
        assert_eq!(web.restart, Some(RestartPolicy::Always));
        assert_eq!(web.ports, vec!["8080:80", "443"]);
        assert_eq!(web.environment, vec!["TZ=Etc/UTC", "DEBUG"]);
        assert_eq!(web.resource_limits, Some(ResourceLimits::new("0.5", "128M")));
        assert!(web.extras.is_empty());
    }

    #[test]
    fn test_unfitting_fields_kept_verbatim() {
        let doc = parse_string(
            r#"services:
  worker:
    restart: on-failure:3
    depends_on:
      db:
        condition: service_healthy
    deploy:
      replicas: 2
    command: ["run", "--fast"]
"#,
        )
        .unwrap();

        let worker = doc.service("worker").unwrap();
        assert_eq!(worker.restart, None);
        assert!(worker.depends_on.is_empty());
        assert_eq!(worker.resource_limits, None);
        let keys: Vec<_> = worker.extras.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["restart", "depends_on", "deploy", "command"]);

        let out = write_string(&doc);
        assert!(out.contains("    restart: on-failure:3\n"));
        assert!(out.contains("    depends_on:\n      db:\n        condition: service_healthy\n"));
        // Canonical slots still apply to kept fields.
        assert!(out.find("restart:").unwrap() < out.find("depends_on:").unwrap());
        assert!(out.find("deploy:").unwrap() < out.find("command:").unwrap());
    }

    #[test]
    fn test_networks_with_options_rejected() {
        let err = parse_string(
            "services:\n  web:\n    networks:\n      proxy:\n        aliases: [site]\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidField { ref service, ref field, .. } if service == "web" && field == "networks"));

        let doc = parse_string("services:\n  web:\n    networks:\n      proxy:\n      backend: {}\n").unwrap();
        assert_eq!(doc.service("web").unwrap().networks, vec!["proxy", "backend"]);
    }

    #[test]
    fn test_parse_networks() {
        let doc = parse_string(
            "networks:\n  proxy:\n    external: true\n    driver: bridge\n  backend:\n    driver: bridge\n    internal: true\n    ipam:\n      driver: default\n  plain:\n",
        )
        .unwrap();

        let proxy = doc.network("proxy").unwrap();
        assert!(proxy.is_external());
        assert_eq!(proxy.driver(), None);

        let backend = doc.network("backend").unwrap();
        assert_eq!(backend.driver(), Some("bridge"));
        assert_eq!(backend.internal(), Some(true));
        assert!(backend.extras().contains_key("ipam"));

        assert_eq!(doc.network("plain"), Some(&Network::default()));
    }

    #[test]
    fn test_annotations_recovered() {
        let doc = parse_string(
            "services:\n  web:\n    # public site\n    image: nginx:latest\n",
        )
        .unwrap();
        assert_eq!(doc.service("web").unwrap().annotations, vec!["public site"]);
    }

    #[test]
    fn test_parse_errors_carry_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compose.yml");
        std::fs::write(&path, "services: [web]\n").unwrap();

        let err = parse_file(&path).unwrap_err();
        assert!(err.to_string().contains("compose.yml"));
        assert!(parse_string("- a\n- b\n").is_err());
        assert!(parse_string("services:\n  web: [1]\n").is_err());
    }

    #[test]
    fn test_canonical_text_round_trips() {
        let text = "services:
  db:
    container_name: db
    image: postgres:16
    restart: unless-stopped
    networks:
      - backend
  web:
    # public site
    container_name: web
    image: nginx:latest
    restart: unless-stopped
    networks:
      - backend
      - proxy
    ports:
      - \"8080:80\"
    depends_on:
      - db
    healthcheck:
      test:
        - CMD
        - true
networks:
  backend:
    name: backend
    driver: bridge
    internal: true
  proxy:
    name: proxy
    external: true
";
        let doc = parse_string(text).unwrap();
        assert_eq!(write_string(&doc), text);
    }
}
