mod cli;
mod commands;
mod config;
mod progress;
mod prompt;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Settings;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Where settings are loaded from and saved to
    pub config_path: PathBuf,
    /// Settings as stored on disk
    pub settings: Settings,
    /// `--infra-file` for this invocation
    pub infra_override: Option<PathBuf>,
}

impl Context {
    /// The shared-infrastructure file in effect.
    pub fn infra_file(&self) -> PathBuf {
        self.infra_override
            .clone()
            .unwrap_or_else(|| self.settings.infra_path())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "berth", &mut io::stdout());
        return Ok(());
    }

    let config_path = config::config_path()?;
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        settings: Settings::load_from(&config_path)?,
        config_path,
        infra_override: cli.infra_file,
    };

    let result = match cli.command {
        Command::Add(args) => commands::add::run(&ctx, args),
        Command::Remove(args) => commands::remove::run(&ctx, args),
        Command::Build(args) => commands::build::run(&ctx, args),
        Command::List(args) => commands::list::run(&ctx, args),
        Command::Settings { command } => commands::settings::run(&ctx, command),
        Command::Completions { .. } => Ok(()),
    };

    if let Err(err) = &result
        && let Some(kind) = err.downcast_ref::<composekit::Error>().map(composekit::Error::category)
    {
        ui::error(kind.description());
        ui::dim(kind.advice());
    }
    result
}
