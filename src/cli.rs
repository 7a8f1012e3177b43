use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use composekit::RestartPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "berth")]
#[command(version)]
#[command(about = "Generate and maintain canonical compose files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Shared-infrastructure file (overrides the saved setting)
    #[arg(short = 'F', long, global = true, env = "BERTH_INFRA_FILE", value_name = "PATH")]
    pub infra_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactively add services to <APP>/compose.yml
    Add(AddArgs),

    /// Remove services and prune networks nothing uses anymore
    #[command(visible_alias = "rm")]
    Remove(RemoveArgs),

    /// Generate a fresh compose file from flags, replacing any existing one
    Build(BuildArgs),

    /// Show the services of an application
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show or change saved settings (interactive when no subcommand is given)
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommand>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Descriptor commands
// ============================================================================

#[derive(Args)]
pub struct AddArgs {
    /// Application directory under the current directory
    pub app: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Application directory under the current directory
    pub app: String,

    /// Services to remove (prompted for when omitted)
    pub services: Vec<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Application directory under the current directory
    #[arg(long)]
    pub app: String,

    /// Service as NAME:IMAGE (repeatable)
    #[arg(short, long = "service", value_name = "NAME:IMAGE", required = true)]
    pub services: Vec<String>,

    /// Restart policy for every service
    #[arg(long, default_value_t = RestartPolicy::UnlessStopped)]
    pub restart: RestartPolicy,

    /// Network to reference from every service (repeatable)
    #[arg(short, long = "network", value_name = "NAME")]
    pub networks: Vec<String>,

    /// Port mapping for every service (repeatable)
    #[arg(short, long = "port", value_name = "HOST:CONTAINER")]
    pub ports: Vec<String>,

    /// Environment variable for every service (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Volume binding for every service (repeatable)
    #[arg(long = "volume", value_name = "HOST:CONTAINER")]
    pub volumes: Vec<String>,

    /// Resource preset (a saved name, Custom or None)
    #[arg(short = 'r', long)]
    pub preset: Option<String>,

    /// CPU limit for the Custom preset
    #[arg(long)]
    pub cpus: Option<String>,

    /// Memory limit for the Custom preset
    #[arg(long)]
    pub memory: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Application directory under the current directory
    pub app: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show the active settings and preset table
    Show,

    /// Save the shared-infrastructure file path
    SetInfra {
        /// Path to the infrastructure compose file
        path: String,
    },

    /// Add or replace a resource preset
    Preset {
        /// Preset name
        name: String,

        /// CPU limit (e.g. 0.5)
        #[arg(long)]
        cpus: String,

        /// Memory limit (e.g. 128M)
        #[arg(long)]
        memory: String,
    },

    /// Delete a resource preset
    RemovePreset {
        /// Preset name
        name: String,
    },

    /// Restore the default preset table
    ResetPresets,
}
