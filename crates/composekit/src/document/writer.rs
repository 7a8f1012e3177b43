//! Writer for generating descriptor text.
//!
//! Output uses two-space indentation for mappings and sequences, sorts
//! services and networks by name, orders fields per [`crate::ordering`],
//! and omits `networks` when there are none. Port mappings are always
//! double-quoted; other strings are quoted only when a plain scalar would
//! be read back as something else.

use crate::descriptor::Descriptor;
use crate::document::annotate;
use crate::error::Result;
use crate::ordering::{order_network_fields, order_service_fields};
use crate::types::{Network, Service};
use serde_yaml::{Mapping, Value};
use std::fmt::Write;
use std::path::Path;

const STEP: usize = 2;

/// Write a descriptor to a file, replacing its contents.
pub fn write_file(doc: &Descriptor, path: &Path) -> Result<()> {
    std::fs::write(path, write_string(doc))?;
    Ok(())
}

/// Render a descriptor with annotations spliced in.
pub fn write_string(doc: &Descriptor) -> String {
    annotate::splice(&render(doc), doc)
}

/// Render the structure of a descriptor, without annotations.
pub fn render(doc: &Descriptor) -> String {
    let mut out = String::new();

    if doc.services.is_empty() {
        out.push_str("services: {}\n");
    } else {
        out.push_str("services:\n");
        for (name, service) in doc.services.sorted() {
            write_service(&mut out, name, service);
        }
    }

    if !doc.networks.is_empty() {
        out.push_str("networks:\n");
        for (name, network) in doc.networks.sorted() {
            write_network(&mut out, name, network);
        }
    }

    out
}

fn write_service(out: &mut String, name: &str, service: &Service) {
    let fields = service.present_fields();
    if fields.is_empty() && service.extras.is_empty() {
        writeln!(out, "  {}: {{}}", plain_or_quoted(name)).unwrap();
        return;
    }
    writeln!(out, "  {}:", plain_or_quoted(name)).unwrap();

    let indent = STEP * 2;
    for field in order_service_fields(&fields) {
        match field {
            "container_name" if service.container_name.is_some() => {
                write_scalar(out, indent, field, service.container_name.as_deref());
            }
            "image" if service.image.is_some() => {
                write_scalar(out, indent, field, service.image.as_deref());
            }
            "restart" if service.restart.is_some() => {
                write_scalar(out, indent, field, service.restart.map(|r| r.as_str()));
            }
            "networks" if !service.networks.is_empty() => {
                write_list(out, indent, field, &service.networks, false);
            }
            "ports" if !service.ports.is_empty() => {
                write_list(out, indent, field, &service.ports, true);
            }
            "volumes" if !service.volumes.is_empty() => {
                write_list(out, indent, field, &service.volumes, false);
            }
            "environment" if !service.environment.is_empty() => {
                write_list(out, indent, field, &service.environment, false);
            }
            "depends_on" if !service.depends_on.is_empty() => {
                write_list(out, indent, field, &service.depends_on, false);
            }
            "labels" if !service.labels.is_empty() => {
                write_list(out, indent, field, &service.labels, false);
            }
            "deploy" if service.resource_limits.is_some() => {
                if let Some(limits) = &service.resource_limits {
                    let pad = " ".repeat(indent);
                    writeln!(out, "{pad}deploy:").unwrap();
                    writeln!(out, "{pad}  resources:").unwrap();
                    writeln!(out, "{pad}    limits:").unwrap();
                    write_scalar(out, indent + STEP * 3, "cpus", Some(limits.cpus.as_str()));
                    write_scalar(out, indent + STEP * 3, "memory", Some(limits.memory.as_str()));
                }
            }
            "ports" => write_port_extra(out, indent, &service.extras),
            other => write_extra(out, indent, other, &service.extras),
        }
    }
    write_non_string_keys(out, indent, &service.extras);
}

/// A `ports` sequence kept verbatim: short-syntax items are still quoted,
/// long-syntax mappings are written as read.
fn write_port_extra(out: &mut String, indent: usize, extras: &Mapping) {
    let Some(Value::Sequence(items)) = extras.get("ports") else {
        write_extra(out, indent, "ports", extras);
        return;
    };
    if items.is_empty() {
        write_extra(out, indent, "ports", extras);
        return;
    }
    let pad = " ".repeat(indent);
    writeln!(out, "{pad}ports:").unwrap();
    for item in items {
        match item {
            Value::String(s) => writeln!(out, "{pad}  - {}", quoted(s)).unwrap(),
            Value::Number(n) => writeln!(out, "{pad}  - {}", quoted(&n.to_string())).unwrap(),
            other => write_sequence(out, indent + STEP, std::slice::from_ref(other)),
        }
    }
}

fn write_network(out: &mut String, name: &str, network: &Network) {
    let fields = network.present_fields();
    if fields.is_empty() && network.extras().is_empty() {
        writeln!(out, "  {}: {{}}", plain_or_quoted(name)).unwrap();
        return;
    }
    writeln!(out, "  {}:", plain_or_quoted(name)).unwrap();

    let indent = STEP * 2;
    for field in order_network_fields(&fields) {
        let flag = match field {
            "name" if network.name().is_some() => {
                write_scalar(out, indent, field, network.name());
                continue;
            }
            "driver" if network.driver().is_some() => {
                write_scalar(out, indent, field, network.driver());
                continue;
            }
            "internal" => network.internal(),
            "external" => network.external_flag(),
            "enable_ipv6" => network.enable_ipv6(),
            _ => None,
        };
        match flag {
            Some(value) => {
                writeln!(out, "{}{field}: {value}", " ".repeat(indent)).unwrap();
            }
            None => write_extra(out, indent, field, network.extras()),
        }
    }
    write_non_string_keys(out, indent, network.extras());
}

fn write_scalar(out: &mut String, indent: usize, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        writeln!(out, "{}{key}: {}", " ".repeat(indent), plain_or_quoted(value)).unwrap();
    }
}

fn write_list(out: &mut String, indent: usize, key: &str, items: &[String], always_quote: bool) {
    let pad = " ".repeat(indent);
    writeln!(out, "{pad}{key}:").unwrap();
    for item in items {
        let item = if always_quote {
            quoted(item)
        } else {
            plain_or_quoted(item)
        };
        writeln!(out, "{pad}  - {item}").unwrap();
    }
}

fn write_extra(out: &mut String, indent: usize, key: &str, extras: &Mapping) {
    if let Some(value) = extras.get(key) {
        write_entry(out, indent, &plain_or_quoted(key), value);
    }
}

fn write_non_string_keys(out: &mut String, indent: usize, extras: &Mapping) {
    for (key, value) in extras.iter().filter(|(k, _)| !k.is_string()) {
        write_entry(out, indent, &inline(key), value);
    }
}

// ============================================================================
// Generic values
// ============================================================================

fn write_entry(out: &mut String, indent: usize, key: &str, value: &Value) {
    let pad = " ".repeat(indent);
    let (tag, value) = match value {
        Value::Tagged(tagged) => (Some(tagged.tag.to_string()), &tagged.value),
        other => (None, other),
    };
    let tag_suffix = tag.map(|t| format!(" {t}")).unwrap_or_default();

    match value {
        Value::Mapping(map) if !map.is_empty() => {
            writeln!(out, "{pad}{key}:{tag_suffix}").unwrap();
            write_mapping(out, indent + STEP, map);
        }
        Value::Sequence(items) if !items.is_empty() => {
            writeln!(out, "{pad}{key}:{tag_suffix}").unwrap();
            write_sequence(out, indent + STEP, items);
        }
        scalar => {
            writeln!(out, "{pad}{key}:{tag_suffix} {}", inline(scalar)).unwrap();
        }
    }
}

fn write_mapping(out: &mut String, indent: usize, map: &Mapping) {
    for (key, value) in map {
        let key = match key.as_str() {
            Some(s) => plain_or_quoted(s),
            None => inline(key),
        };
        write_entry(out, indent, &key, value);
    }
}

fn write_sequence(out: &mut String, indent: usize, items: &[Value]) {
    let pad = " ".repeat(indent);
    for item in items {
        match item {
            Value::Mapping(map) if !map.is_empty() => {
                // The first entry shares the dash line; the rest align under it.
                let mut nested = String::new();
                write_mapping(&mut nested, indent + STEP, map);
                let body = nested.get(indent + STEP..).unwrap_or_default();
                write!(out, "{pad}- {body}").unwrap();
            }
            Value::Sequence(inner) if !inner.is_empty() => {
                writeln!(out, "{pad}-").unwrap();
                write_sequence(out, indent + STEP, inner);
            }
            scalar => {
                writeln!(out, "{pad}- {}", inline(scalar)).unwrap();
            }
        }
    }
}

/// Render a value that fits on one line.
fn inline(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => plain_or_quoted(s),
        Value::Sequence(_) => "[]".to_string(),
        Value::Mapping(_) => "{}".to_string(),
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, inline(&tagged.value)),
    }
}

// ============================================================================
// Scalar quoting
// ============================================================================

const RESERVED_WORDS: [&str; 11] = [
    "true", "false", "yes", "no", "on", "off", "y", "n", "null", "~", "",
];

const INDICATORS: &str = "-?:,[]{}#&*!|>'\"%@`";

/// Emit a string plain when that reads back as the same string, quoted
/// otherwise.
pub fn plain_or_quoted(s: &str) -> String {
    if needs_quotes(s) {
        quoted(s)
    } else {
        s.to_string()
    }
}

/// Emit a string as a double-quoted scalar.
pub fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => write!(out, "\\u{:04x}", c as u32).unwrap(),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn needs_quotes(s: &str) -> bool {
    if RESERVED_WORDS.contains(&s.to_lowercase().as_str()) {
        return true;
    }
    if s != s.trim() || s.chars().any(char::is_control) {
        return true;
    }
    if s.starts_with(|c: char| INDICATORS.contains(c)) {
        return true;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return true;
    }
    looks_numeric(s)
}

/// Numbers in any notation a YAML 1.1 or 1.2 reader would convert,
/// including base-60 values like `8080:80`.
fn looks_numeric(s: &str) -> bool {
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    if unsigned.is_empty() {
        return false;
    }
    let digits_only = unsigned.replace('_', "");
    if digits_only.parse::<f64>().is_ok() {
        return true;
    }
    for prefix in ["0x", "0o", "0b"] {
        if let Some(rest) = unsigned.strip_prefix(prefix)
            && !rest.is_empty()
            && rest.chars().all(|c| c.is_ascii_hexdigit() || c == '_')
        {
            return true;
        }
    }
    is_sexagesimal(unsigned)
}

fn is_sexagesimal(s: &str) -> bool {
    let (whole, fraction) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };
    let mut parts = whole.split(':');
    let head = parts.next().unwrap_or_default();
    if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit() || c == '_') {
        return false;
    }
    let mut has_tail = false;
    for part in parts {
        has_tail = true;
        let ok = (1..=2).contains(&part.len())
            && part.chars().all(|c| c.is_ascii_digit())
            && part.parse::<u8>().is_ok_and(|n| n < 60);
        if !ok {
            return false;
        }
    }
    has_tail && fraction.is_none_or(|f| f.chars().all(|c| c.is_ascii_digit() || c == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NetworkKind, ResourceLimits, RestartPolicy};

    fn web() -> Service {
        Service {
            container_name: Some("web".into()),
            image: Some("nginx:latest".into()),
            restart: Some(RestartPolicy::UnlessStopped),
            networks: vec!["proxy".into()],
            ports: vec!["8080:80".into(), "443:443/tcp".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_render_layout() {
        let mut doc = Descriptor::new();
        let mut service = web();
        service.resource_limits = Some(ResourceLimits::new("0.2", "64M"));
        doc.set_service("web", service);
        doc.set_network("proxy", Network::external("proxy"));

        assert_eq!(
            render(&doc),
            "services:
  web:
    container_name: web
    image: nginx:latest
    restart: unless-stopped
    networks:
      - proxy
    ports:
      - \"8080:80\"
      - \"443:443/tcp\"
    deploy:
      resources:
        limits:
          cpus: \"0.2\"
          memory: 64M
networks:
  proxy:
    name: proxy
    external: true
"
        );
    }

    #[test]
    fn test_ports_always_quoted() {
        let mut doc = Descriptor::new();
        let mut service = Service::default();
        service.ports = vec!["80".into(), "web".into(), "8080:80".into()];
        doc.set_service("app", service);

        let out = render(&doc);
        assert!(out.contains("      - \"80\"\n"));
        assert!(out.contains("      - \"web\"\n"));
        assert!(out.contains("      - \"8080:80\"\n"));
    }

    #[test]
    fn test_mixed_port_syntax_still_quoted() {
        let doc = crate::document::parse_string(
            "services:\n  web:\n    ports:\n      - 8080:80\n      - 9000\n      - target: 443\n        published: 8443\n",
        )
        .unwrap();
        assert!(doc.service("web").unwrap().ports.is_empty());

        let out = render(&doc);
        assert!(out.contains("    ports:\n      - \"8080:80\"\n      - \"9000\"\n"));
        assert!(out.contains("      - target: 443\n        published: 8443\n"));
    }

    #[test]
    fn test_empty_networks_omitted() {
        let mut doc = Descriptor::new();
        assert_eq!(render(&doc), "services: {}\n");

        doc.set_service("app", web());
        assert!(!render(&doc).lines().any(|line| line.starts_with("networks")));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut first = Descriptor::new();
        first.set_service("web", web());
        first.set_service("db", Service::default());
        first.set_network("proxy", Network::external("proxy"));
        first.set_network("backend", Network::of_kind("backend", NetworkKind::Internal));

        let mut second = Descriptor::new();
        second.set_network("backend", Network::of_kind("backend", NetworkKind::Internal));
        second.set_service("db", Service::default());
        second.set_network("proxy", Network::external("proxy"));
        second.set_service("web", web());

        assert_eq!(write_string(&first), write_string(&second));
    }

    #[test]
    fn test_managed_network_fields() {
        let mut doc = Descriptor::new();
        doc.set_network("backend", Network::of_kind("backend", NetworkKind::Internal));
        doc.set_network("edge", Network::of_kind("edge", NetworkKind::Internet));

        let out = render(&doc);
        assert!(out.contains("  backend:\n    name: backend\n    driver: bridge\n    internal: true\n"));
        assert!(out.contains("  edge:\n    name: edge\n    driver: bridge\n    enable_ipv6: true\n"));
    }

    #[test]
    fn test_extras_follow_known_fields() {
        let mut service = web();
        let extras: Mapping = serde_yaml::from_str(
            "healthcheck:\n  test: [\"CMD\", \"curl\", \"-f\", \"http://localhost\"]\n  interval: 30s\ncommand: [\"nginx\", \"-g\", \"daemon off;\"]\nulimits:\n  - name: nofile\n    soft: 1024\n",
        )
        .unwrap();
        service.extras = extras;
        let mut doc = Descriptor::new();
        doc.set_service("web", service);

        let out = render(&doc);
        let ports_at = out.find("    ports:").unwrap();
        let health_at = out.find("    healthcheck:").unwrap();
        let command_at = out.find("    command:").unwrap();
        assert!(ports_at < health_at && health_at < command_at);
        assert!(out.contains("      test:\n        - CMD\n        - curl\n        - \"-f\"\n"));
        assert!(out.contains("      - \"daemon off;\"\n") || out.contains("      - daemon off;\n"));
        assert!(out.contains("    ulimits:\n      - name: nofile\n        soft: 1024\n"));
    }

    #[test]
    fn test_quoting_rules() {
        assert_eq!(plain_or_quoted("nginx:latest"), "nginx:latest");
        assert_eq!(plain_or_quoted("./data:/data"), "./data:/data");
        assert_eq!(plain_or_quoted("TZ=Etc/UTC"), "TZ=Etc/UTC");
        assert_eq!(plain_or_quoted("64M"), "64M");
        assert_eq!(plain_or_quoted("0.5"), "\"0.5\"");
        assert_eq!(plain_or_quoted("1"), "\"1\"");
        assert_eq!(plain_or_quoted("yes"), "\"yes\"");
        assert_eq!(plain_or_quoted("No"), "\"No\"");
        assert_eq!(plain_or_quoted(""), "\"\"");
        assert_eq!(plain_or_quoted("22:22"), "\"22:22\"");
        assert_eq!(plain_or_quoted("0x1F"), "\"0x1F\"");
        assert_eq!(plain_or_quoted("a: b"), "\"a: b\"");
        assert_eq!(plain_or_quoted("*ref"), "\"*ref\"");
        assert_eq!(plain_or_quoted("say \"hi\""), "say \"hi\"");
        assert_eq!(quoted("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    }

    #[test]
    fn test_rendered_text_parses_back() {
        let mut doc = Descriptor::new();
        let mut service = web();
        service.environment = vec!["TZ=Etc/UTC".into(), "EMPTY=".into()];
        service.labels = vec!["com.centurylinklabs.watchtower.enable=true".into()];
        doc.set_service("web", service);

        let value: Value = serde_yaml::from_str(&render(&doc)).unwrap();
        let ports = &value["services"]["web"]["ports"];
        assert_eq!(ports[0].as_str(), Some("8080:80"));
        assert_eq!(
            value["services"]["web"]["environment"][1].as_str(),
            Some("EMPTY=")
        );
    }
}
