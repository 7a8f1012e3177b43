use anyhow::{Context as AnyhowContext, Result};
use composekit::{Descriptor, document};
use serde::Serialize;

use crate::Context;
use crate::cli::ListArgs;
use crate::commands;
use crate::ui;

const HEADERS: [&str; 9] = [
    "Name",
    "Image",
    "Ports",
    "Networks",
    "CPUs",
    "Memory",
    "Env",
    "Volumes",
    "Auto-Update",
];

/// One service, flattened for display.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ServiceRow {
    pub name: String,
    pub image: Option<String>,
    pub ports: Vec<String>,
    pub networks: Vec<String>,
    pub cpus: Option<String>,
    pub memory: Option<String>,
    pub environment: Vec<String>,
    pub volumes: Vec<String>,
    pub auto_update: bool,
}

impl ServiceRow {
    fn cells(&self) -> Vec<String> {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| ui::EMPTY_CELL.to_string());
        vec![
            self.name.clone(),
            or_dash(&self.image),
            ui::cell(&self.ports),
            ui::cell(&self.networks),
            or_dash(&self.cpus),
            or_dash(&self.memory),
            ui::cell(&self.environment),
            ui::cell(&self.volumes),
            if self.auto_update { "Yes" } else { "No" }.to_string(),
        ]
    }
}

/// Rows in service-name order. External networks are prefixed `(E)`.
pub fn rows(doc: &Descriptor) -> Vec<ServiceRow> {
    doc.services
        .sorted()
        .into_iter()
        .map(|(name, service)| {
            let networks = service
                .networks
                .iter()
                .map(|n| {
                    if doc.network(n).is_some_and(composekit::Network::is_external) {
                        format!("(E){n}")
                    } else {
                        n.clone()
                    }
                })
                .collect();
            let limits = service.resource_limits.as_ref();
            ServiceRow {
                name: name.to_string(),
                image: service.image.clone(),
                ports: service.ports.clone(),
                networks,
                cpus: limits.map(|l| l.cpus.clone()),
                memory: limits.map(|l| l.memory.clone()),
                environment: service.environment.clone(),
                volumes: service.volumes.clone(),
                auto_update: service.auto_updates(),
            }
        })
        .collect()
}

/// Print the service table for a descriptor.
pub fn print_table(doc: &Descriptor) {
    let cells: Vec<Vec<String>> = rows(doc).iter().map(ServiceRow::cells).collect();
    ui::table(&HEADERS, &cells);
}

pub fn run(ctx: &Context, args: ListArgs) -> Result<()> {
    let path = commands::descriptor_path(ctx, &commands::app_dir(&args.app)?);
    if !path.exists() {
        ui::warn(&format!("No compose file found in '{}'", args.app));
        return Ok(());
    }

    let doc = document::parse_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&rows(&doc)).context("Failed to serialize rows")?;
        println!("{json}");
        return Ok(());
    }

    ui::header(&format!("Services in '{}'", args.app));
    if doc.services.is_empty() {
        ui::dim("No services defined");
        return Ok(());
    }
    print_table(&doc);
    Ok(())
}
