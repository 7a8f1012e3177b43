use anyhow::Result;
use colored::Colorize;
use composekit::{Preset, PresetTable};

use crate::Context;
use crate::cli::SettingsCommand;
use crate::config::Settings;
use crate::prompt::{self, Prompter, TerminalPrompter};
use crate::ui;

pub fn run(ctx: &Context, command: Option<SettingsCommand>) -> Result<()> {
    let mut settings = ctx.settings.clone();

    match command {
        Some(SettingsCommand::Show) => {
            show(ctx);
            return Ok(());
        }
        Some(SettingsCommand::SetInfra { path }) => {
            settings.infra_file = path;
        }
        Some(SettingsCommand::Preset { name, cpus, memory }) => {
            settings.presets.upsert(Preset::new(name, cpus, memory))?;
        }
        Some(SettingsCommand::RemovePreset { name }) => {
            if !settings.presets.remove(&name) {
                ui::warn(&format!("No preset named '{name}'"));
                return Ok(());
            }
        }
        Some(SettingsCommand::ResetPresets) => {
            settings.presets = PresetTable::default();
        }
        None => {
            prompt::require_terminal("berth settings")?;
            match edit(&mut TerminalPrompter, &mut settings) {
                Err(err) if prompt::is_aborted(&err) => {
                    println!();
                    ui::warn("Aborted; settings unchanged");
                    return Ok(());
                }
                result => result?,
            }
        }
    }

    if settings == ctx.settings {
        ui::info("Settings unchanged");
        return Ok(());
    }
    settings.save_to(&ctx.config_path)?;
    ui::success(&format!("Saved {}", ctx.config_path.display()));
    Ok(())
}

fn show(ctx: &Context) {
    let settings = &ctx.settings;
    ui::header("berth settings");
    ui::kv("Config file", &ctx.config_path.display().to_string());

    let infra = ctx.infra_file();
    if ctx.infra_override.is_some() {
        ui::kv("Infra file", &format!("{} {}", infra.display(), "(overridden)".dimmed()));
    } else {
        ui::kv("Infra file", &infra.display().to_string());
    }
    ui::kv("Compose file", &settings.compose_file);
    let validator = if settings.validator.is_empty() {
        "disabled".dimmed().to_string()
    } else {
        settings.validator.join(" ")
    };
    ui::kv("Validator", &validator);
    ui::kv("Default env", &settings.default_env.join(", "));

    ui::section("Resource presets");
    let rows: Vec<Vec<String>> = settings
        .presets
        .iter()
        .map(|p| vec![p.name.clone(), p.cpus.clone(), p.memory.clone()])
        .collect();
    ui::table(&["Name", "CPUs", "Memory"], &rows);
}

const ACTIONS: [&str; 4] = [
    "Add or edit a preset",
    "Remove a preset",
    "Reset presets to defaults",
    "Done",
];

/// Interactive editing of the infra path and preset table.
pub fn edit(prompter: &mut dyn Prompter, settings: &mut Settings) -> Result<()> {
    let infra = prompter.text("Infrastructure file", Some(&settings.infra_file))?;
    if !infra.trim().is_empty() {
        settings.infra_file = infra.trim().to_string();
    }

    let actions: Vec<String> = ACTIONS.iter().map(|a| (*a).to_string()).collect();
    loop {
        match prompter.select("Presets", &actions, ACTIONS.len() - 1)? {
            0 => {
                let name = prompter.text("Preset name", None)?;
                let existing = settings.presets.get(name.trim()).cloned();
                let cpus = prompter.text("CPU limit", existing.as_ref().map(|p| p.cpus.as_str()))?;
                let memory =
                    prompter.text("Memory limit", existing.as_ref().map(|p| p.memory.as_str()))?;
                let preset = Preset::new(name.trim(), cpus.trim(), memory.trim());
                if let Err(e) = settings.presets.upsert(preset) {
                    ui::warn(&e.to_string());
                }
            }
            1 => {
                let names: Vec<String> = settings.presets.iter().map(|p| p.name.clone()).collect();
                if names.is_empty() {
                    ui::info("No presets defined");
                    continue;
                }
                let index = prompter.select("Preset to remove", &names, 0)?;
                settings.presets.remove(&names[index]);
            }
            2 => settings.presets = PresetTable::default(),
            _ => return Ok(()),
        }
    }
}
