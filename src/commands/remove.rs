use anyhow::{Context as AnyhowContext, Result};
use composekit::{document, merge};
use std::path::Path;

use crate::Context;
use crate::cli::RemoveArgs;
use crate::commands;
use crate::prompt::{self, Prompter, TerminalPrompter};
use crate::ui;

pub fn run(ctx: &Context, args: RemoveArgs) -> Result<()> {
    let app_dir = commands::app_dir(&args.app)?;
    let result = if args.services.is_empty() {
        prompt::require_terminal("berth remove")?;
        execute(ctx, Some(&mut TerminalPrompter), &app_dir, &[])
    } else {
        execute(ctx, None, &app_dir, &args.services)
    };

    match result {
        Err(err) if prompt::is_aborted(&err) => {
            println!();
            ui::warn("Aborted; nothing was written");
            Ok(())
        }
        result => result,
    }
}

/// Remove `names`, or the services picked through `prompter` when `names`
/// is empty.
pub fn execute(
    ctx: &Context,
    prompter: Option<&mut dyn Prompter>,
    app_dir: &Path,
    names: &[String],
) -> Result<()> {
    let path = commands::descriptor_path(ctx, app_dir);
    if !path.exists() {
        ui::warn(&format!("No compose file at {}; nothing to remove", path.display()));
        return Ok(());
    }

    let mut doc = document::parse_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let selected: Vec<String> = match prompter {
        Some(prompter) if names.is_empty() => {
            let existing: Vec<String> = doc.services.names().map(str::to_string).collect();
            if existing.is_empty() {
                ui::info("No services defined; nothing to remove");
                return Ok(());
            }
            prompter
                .multi_select("Services to remove", &existing)?
                .into_iter()
                .map(|i| existing[i].clone())
                .collect()
        }
        _ => names.to_vec(),
    };
    if selected.is_empty() {
        ui::info("Nothing selected");
        return Ok(());
    }

    let report = merge::remove(&mut doc, &selected);
    for name in &report.missing {
        ui::warn(&format!("Service '{name}' not found; skipped"));
    }
    if !report.changed() {
        ui::info("Nothing to remove");
        return Ok(());
    }

    for name in &report.removed {
        ui::success(&format!("Removed service '{name}'"));
    }
    for network in &report.pruned_networks {
        ui::dim(&format!("Pruned unused network '{network}'"));
    }
    commands::write_and_validate(ctx, &doc, &path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::prompt::testing::{Answer::*, ScriptedPrompter};
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = "\
services:
  db:
    image: postgres:16
    networks:
      - backend
  web:
    image: nginx:latest
    networks:
      - proxy
      - backend
  worker:
    image: app:1
    networks:
      - jobs
networks:
  backend:
    name: backend
    driver: bridge
    internal: true
  jobs:
    name: jobs
    driver: bridge
  proxy:
    name: proxy
    external: true
";

    fn setup() -> (TempDir, Context, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let ctx = testing::context(&dir.path().join("infra.yml"));
        let app_dir = dir.path().join("media");
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(app_dir.join("compose.yml"), DESCRIPTOR).unwrap();
        (dir, ctx, app_dir)
    }

    #[test]
    fn test_remove_named_services_prunes_networks() {
        let (_dir, ctx, app_dir) = setup();

        execute(&ctx, None, &app_dir, &["worker".to_string(), "web".to_string()]).unwrap();

        let written = fs::read_to_string(app_dir.join("compose.yml")).unwrap();
        assert_eq!(
            written,
            "services:\n  db:\n    image: postgres:16\n    networks:\n      - backend\nnetworks:\n  backend:\n    name: backend\n    driver: bridge\n    internal: true\n"
        );
    }

    #[test]
    fn test_remove_interactive_selection() {
        let (_dir, ctx, app_dir) = setup();
        let mut prompter = ScriptedPrompter::new([Multi(vec![0])]);

        execute(&ctx, Some(&mut prompter), &app_dir, &[]).unwrap();

        let doc = document::parse_file(&app_dir.join("compose.yml")).unwrap();
        assert!(doc.service("db").is_none());
        assert!(doc.network("backend").is_some());
    }

    #[test]
    fn test_remove_unknown_name_leaves_file_untouched() {
        let (_dir, ctx, app_dir) = setup();

        execute(&ctx, None, &app_dir, &["ghost".to_string()]).unwrap();

        assert_eq!(fs::read_to_string(app_dir.join("compose.yml")).unwrap(), DESCRIPTOR);
    }

    #[test]
    fn test_remove_without_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let ctx = testing::context(&dir.path().join("infra.yml"));

        execute(&ctx, None, &dir.path().join("missing"), &["web".to_string()]).unwrap();

        assert!(!dir.path().join("missing").exists());
    }
}
