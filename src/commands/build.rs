use anyhow::Result;
use composekit::presets::{CUSTOM, NONE};
use composekit::{BuildRequest, ResourceLimits, merge, reconcile};
use std::path::Path;

use crate::Context;
use crate::cli::BuildArgs;
use crate::commands;
use crate::ui;

pub fn run(ctx: &Context, args: BuildArgs) -> Result<()> {
    let app_dir = commands::app_dir(&args.app)?;
    execute(ctx, args, &app_dir)
}

/// Generate the descriptor from flags and replace the target file.
///
/// Every input error is raised before anything touches the disk.
pub fn execute(ctx: &Context, args: BuildArgs, app_dir: &Path) -> Result<()> {
    let limits = resolve_limits(ctx, &args)?;
    let request = BuildRequest {
        services: args.services,
        restart: args.restart,
        networks: args.networks,
        ports: args.ports,
        environment: args.env,
        volumes: args.volumes,
        limits,
    };
    let doc = merge::build(&request)?;

    let infra = ctx.infra_file();
    if !infra.exists() {
        reconcile::init_infra(&infra)?;
        ui::info(&format!("Created {}", infra.display()));
    }

    let path = commands::descriptor_path(ctx, app_dir);
    if path.exists() {
        ui::warn(&format!("Replacing existing {}", path.display()));
    }
    commands::write_and_validate(ctx, &doc, &path)
}

/// `--cpus`/`--memory` without `--preset` imply the Custom preset.
fn resolve_limits(ctx: &Context, args: &BuildArgs) -> Result<Option<ResourceLimits>> {
    let preset = match args.preset.as_deref() {
        Some(name) => name,
        None if args.cpus.is_some() || args.memory.is_some() => CUSTOM,
        None => NONE,
    };
    Ok(ctx
        .settings
        .presets
        .resolve(preset, args.cpus.as_deref(), args.memory.as_deref())?)
}
