//! Service annotations as comment lines.
//!
//! The writer renders structure only. Annotations are spliced into the
//! rendered text afterwards: one `    # note` line per annotation, placed
//! directly under the service's header line. A header only counts when it
//! sits inside the top-level `services:` block, so a network that shares a
//! service's name never receives its comments.
//!
//! Reading works the same way in reverse: comment lines directly under a
//! service header are that service's annotations.

use crate::descriptor::Descriptor;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const SERVICES_SECTION: &str = "services";
const NOTE_PREFIX: &str = "    # ";

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^\s#][^:]*):").expect("section regex must compile"))
}

fn service_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r##"^  "?([^\s"#:][^":]*)"?:(?:\s.*)?$"##)
            .expect("service header regex must compile")
    })
}

fn note_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^    #\s?(.*)$").expect("note regex must compile"))
}

/// Walks lines and reports which service header (if any) each line is.
struct SectionTracker {
    section: Option<String>,
}

impl SectionTracker {
    fn new() -> Self {
        Self { section: None }
    }

    /// Feed one line; returns the service name when the line is a service
    /// header.
    fn service_header<'a>(&mut self, line: &'a str) -> Option<&'a str> {
        if let Some(caps) = section_re().captures(line) {
            self.section = Some(caps[1].trim_matches('"').to_string());
            return None;
        }
        if self.section.as_deref() != Some(SERVICES_SECTION) {
            return None;
        }
        service_header_re()
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Insert each service's annotations under its header.
///
/// Services without annotations, and every other line, pass through
/// unchanged.
pub fn splice(rendered: &str, doc: &Descriptor) -> String {
    let mut out = String::with_capacity(rendered.len());
    let mut tracker = SectionTracker::new();

    for line in rendered.lines() {
        out.push_str(line);
        out.push('\n');

        let Some(name) = tracker.service_header(line) else {
            continue;
        };
        let Some(service) = doc.service(name) else {
            continue;
        };
        for note in &service.annotations {
            out.push_str(NOTE_PREFIX);
            out.push_str(&note.replace(['\n', '\r'], " "));
            out.push('\n');
        }
    }
    out
}

/// Read annotations back from descriptor text.
///
/// Returns the comment lines found directly under each service header,
/// keyed by service name. Services without such lines are absent.
pub fn recover(content: &str) -> BTreeMap<String, Vec<String>> {
    let mut found: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut tracker = SectionTracker::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        if let Some(name) = current.as_ref()
            && let Some(caps) = note_re().captures(line)
        {
            let note = caps[1].trim();
            if !note.is_empty() {
                found.entry(name.clone()).or_default().push(note.to_string());
            }
            continue;
        }
        current = tracker.service_header(line).map(str::to_string);
    }
    found
}
