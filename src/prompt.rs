//! Operator input collection.
//!
//! Commands talk to a [`Prompter`] rather than to the terminal, so the
//! service wizard runs the same against dialoguer and against a scripted
//! answer list in tests.

use crate::config::Settings;
use crate::ui;
use anyhow::{Result, bail};
use composekit::presets::{CUSTOM, NONE};
use composekit::types::{is_tagged, split_list};
use composekit::{
    AUTO_UPDATE_LABEL, Descriptor, NetworkKind, NetworkRequest, PresetTable, Registry,
    ResourceLimits, RestartPolicy, ServiceSpec,
};
use dialoguer::{Confirm, Input, MultiSelect, Select};
use std::collections::BTreeMap;
use std::io::{ErrorKind, IsTerminal};

/// The operator backed out of a prompt.
///
/// Commands treat this as a clean exit: nothing is written.
#[derive(Debug, thiserror::Error)]
#[error("aborted by operator")]
pub struct Aborted;

/// Whether an error is an operator abort.
pub fn is_aborted(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Aborted>().is_some()
}

/// Source of operator answers.
pub trait Prompter {
    /// Free text. An empty answer returns `default`, or `""` without one.
    fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Pick one item; returns its index.
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<usize>;

    /// Pick any number of items; returns their indices.
    fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Vec<usize>>;

    /// Yes or no.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
}

/// Interactive prompts on the controlling terminal.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        interrupted(input.interact_text())
    }

    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        let choice = Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact_opt();
        interrupted(choice)?.ok_or_else(|| Aborted.into())
    }

    fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Vec<usize>> {
        let choice = MultiSelect::new()
            .with_prompt(prompt)
            .items(items)
            .interact_opt();
        interrupted(choice)?.ok_or_else(|| Aborted.into())
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let choice = Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact_opt();
        interrupted(choice)?.ok_or_else(|| Aborted.into())
    }
}

/// Map Ctrl-C inside a prompt to [`Aborted`].
fn interrupted<T>(result: std::result::Result<T, dialoguer::Error>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(dialoguer::Error::IO(e)) if e.kind() == ErrorKind::Interrupted => Err(Aborted.into()),
        Err(e) => Err(anyhow::Error::new(e).context("Failed to read input")),
    }
}

/// Fail unless both stdin and stdout are terminals.
pub fn require_terminal(command: &str) -> Result<()> {
    if console::user_attended() && std::io::stdin().is_terminal() {
        Ok(())
    } else {
        bail!("'{command}' is interactive and needs a terminal")
    }
}

// ============================================================================
// Service wizard
// ============================================================================

/// What the wizard offers as choices.
pub struct WizardContext<'a> {
    /// Services that can be depended on
    pub known_services: Vec<String>,
    /// Attachable networks; `true` marks registry (external) networks
    pub networks: BTreeMap<String, bool>,
    /// Resource presets
    pub presets: &'a PresetTable,
    /// Environment offered to every service
    pub default_env: &'a [String],
}

impl<'a> WizardContext<'a> {
    /// Choices drawn from the loaded descriptor, the registry and settings.
    pub fn new(doc: &Descriptor, registry: &Registry, settings: &'a Settings) -> Self {
        let mut networks: BTreeMap<String, bool> = doc
            .networks
            .names()
            .map(|name| (name.to_string(), false))
            .collect();
        for name in registry.names() {
            networks.insert(name.to_string(), true);
        }

        Self {
            known_services: doc.services.names().map(str::to_string).collect(),
            networks,
            presets: &settings.presets,
            default_env: &settings.default_env,
        }
    }
}

/// Ask for services until a blank name is entered.
pub fn collect_services(
    prompter: &mut dyn Prompter,
    ctx: &mut WizardContext<'_>,
) -> Result<Vec<ServiceSpec>> {
    let mut specs = Vec::new();
    while let Some(spec) = collect_service(prompter, ctx)? {
        if !ctx.known_services.contains(&spec.name) {
            ctx.known_services.push(spec.name.clone());
        }
        for (network, _) in &spec.networks.create {
            ctx.networks.entry(network.clone()).or_insert(false);
        }
        specs.push(spec);
    }
    Ok(specs)
}

fn collect_service(
    prompter: &mut dyn Prompter,
    ctx: &WizardContext<'_>,
) -> Result<Option<ServiceSpec>> {
    let name = prompter.text("Service name (blank to finish)", None)?;
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    ui::section(&format!("Service '{name}'"));

    let container_name = prompter.text("Container name", Some(name))?;
    let image = ask_image(prompter)?;

    let restart_items: Vec<String> = RestartPolicy::ALL
        .iter()
        .map(|r| format!("{r} - {}", r.description()))
        .collect();
    let restart = RestartPolicy::ALL[prompter.select("Restart policy", &restart_items, 0)?];

    let depends_on = if ctx.known_services.is_empty() {
        Vec::new()
    } else {
        prompter
            .multi_select("Depends on", &ctx.known_services)?
            .into_iter()
            .map(|i| ctx.known_services[i].clone())
            .collect()
    };

    let annotations = split_list(&prompter.text("Notes (comma-separated)", None)?);
    let ports = split_list(&prompter.text("Port mappings (host:container, comma-separated)", None)?);
    let volumes =
        split_list(&prompter.text("Volume bindings (host:container, comma-separated)", None)?);

    let mut environment = Vec::new();
    if !ctx.default_env.is_empty() {
        let keys: Vec<&str> = ctx
            .default_env
            .iter()
            .map(|e| e.split_once('=').map_or(e.as_str(), |(k, _)| k))
            .collect();
        if prompter.confirm(&format!("Include default env vars ({})?", keys.join(", ")), true)? {
            environment.extend(ctx.default_env.iter().cloned());
        }
    }
    environment.extend(split_list(
        &prompter.text("Additional env vars (KEY=VALUE, comma-separated)", None)?,
    ));

    let networks = ask_networks(prompter, ctx)?;
    let limits = ask_limits(prompter, ctx.presets)?;

    let mut labels = Vec::new();
    if prompter.confirm("Enable Watchtower auto-updates?", false)? {
        labels.push(AUTO_UPDATE_LABEL.to_string());
    }

    Ok(Some(ServiceSpec {
        name: name.to_string(),
        container_name: container_name.trim().to_string(),
        image,
        restart,
        networks,
        ports,
        volumes,
        environment,
        depends_on,
        labels,
        limits,
        annotations,
    }))
}

fn ask_image(prompter: &mut dyn Prompter) -> Result<String> {
    let image = loop {
        let answer = prompter.text("Image (repo:tag)", None)?;
        let answer = answer.trim();
        if !answer.is_empty() {
            break answer.to_string();
        }
        ui::warn("An image is required");
    };
    if is_tagged(&image) {
        return Ok(image);
    }

    let base = prompter.text("Base repository", Some(image.trim_end_matches(':')))?;
    let tag = prompter.text("Tag", Some(composekit::types::DEFAULT_TAG))?;
    let (base, tag) = (base.trim().trim_end_matches(':'), tag.trim());
    Ok(if tag.is_empty() {
        base.to_string()
    } else {
        format!("{base}:{tag}")
    })
}

fn ask_networks(prompter: &mut dyn Prompter, ctx: &WizardContext<'_>) -> Result<NetworkRequest> {
    let mut request = NetworkRequest::default();

    if !ctx.networks.is_empty() {
        let names: Vec<&String> = ctx.networks.keys().collect();
        let labels: Vec<String> = ctx
            .networks
            .iter()
            .map(|(name, external)| {
                if *external {
                    format!("(E) {name}")
                } else {
                    name.clone()
                }
            })
            .collect();
        request.attach = prompter
            .multi_select("Attach to existing networks", &labels)?
            .into_iter()
            .map(|i| names[i].clone())
            .collect();
    }

    let kind_items: Vec<String> = NetworkKind::ALL
        .iter()
        .map(|k| format!("{k} - {}", k.description()))
        .collect();
    for network in split_list(&prompter.text("New networks to create (comma-separated)", None)?) {
        let kind = NetworkKind::ALL
            [prompter.select(&format!("Type for network '{network}'"), &kind_items, 0)?];
        request.create.push((network, kind));
    }
    Ok(request)
}

fn ask_limits(prompter: &mut dyn Prompter, presets: &PresetTable) -> Result<Option<ResourceLimits>> {
    let mut names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
    let mut items: Vec<String> = presets
        .iter()
        .map(|p| format!("{} - {} CPUs, {} memory", p.name, p.cpus, p.memory))
        .collect();
    names.extend([CUSTOM, NONE]);
    items.push(format!("{CUSTOM} - enter CPUs and memory"));
    items.push(format!("{NONE} - no limits"));

    let choice = names[prompter.select("Resource preset", &items, items.len() - 1)?];
    if choice != CUSTOM {
        return Ok(presets.resolve(choice, None, None)?);
    }
    loop {
        let cpus = prompter.text("CPU limit", None)?;
        let memory = prompter.text("Memory limit", None)?;
        match presets.resolve(CUSTOM, Some(&cpus), Some(&memory)) {
            Ok(limits) => return Ok(limits),
            Err(e) => ui::warn(&e.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// One scripted answer.
    #[derive(Debug, Clone)]
    pub enum Answer {
        Text(&'static str),
        Select(usize),
        Multi(Vec<usize>),
        Confirm(bool),
        Abort,
    }

    /// Replays answers in order; fails on a mismatched or missing answer.
    pub struct ScriptedPrompter {
        answers: VecDeque<Answer>,
        pub asked: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
            Self {
                answers: answers.into_iter().collect(),
                asked: Vec::new(),
            }
        }

        pub fn finished(&self) -> bool {
            self.answers.is_empty()
        }

        fn next(&mut self, prompt: &str) -> Result<Answer> {
            self.asked.push(prompt.to_string());
            match self.answers.pop_front() {
                Some(Answer::Abort) => Err(Aborted.into()),
                Some(answer) => Ok(answer),
                None => bail!("no scripted answer for '{prompt}'"),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn text(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
            match self.next(prompt)? {
                Answer::Text("") => Ok(default.unwrap_or_default().to_string()),
                Answer::Text(s) => Ok(s.to_string()),
                other => bail!("expected text for '{prompt}', scripted {other:?}"),
            }
        }

        fn select(&mut self, prompt: &str, items: &[String], _default: usize) -> Result<usize> {
            match self.next(prompt)? {
                Answer::Select(i) if i < items.len() => Ok(i),
                other => bail!("expected select for '{prompt}', scripted {other:?}"),
            }
        }

        fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Vec<usize>> {
            match self.next(prompt)? {
                Answer::Multi(v) if v.iter().all(|i| *i < items.len()) => Ok(v),
                other => bail!("expected multi-select for '{prompt}', scripted {other:?}"),
            }
        }

        fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool> {
            match self.next(prompt)? {
                Answer::Confirm(b) => Ok(b),
                other => bail!("expected confirm for '{prompt}', scripted {other:?}"),
            }
        }
    }
}
