//! Persisted settings for berth.
//!
//! Settings live in `config.toml` inside the config directory:
//!
//! 1. `BERTH_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/berth` (if set)
//! 3. `~/.config/berth`
//!
//! A missing file means defaults; a partial file fills the rest with
//! defaults.

use anyhow::{Context, Result};
use composekit::PresetTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "BERTH_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Shared-infrastructure compose file; `~` and `$VARS` are expanded
    pub infra_file: String,
    /// File name of each application's descriptor
    pub compose_file: String,
    /// Validator argv prefix; `-f <path> config` is appended. Empty disables validation.
    pub validator: Vec<String>,
    /// Environment offered to every new service
    pub default_env: Vec<String>,
    /// Resource presets in display order
    pub presets: PresetTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            infra_file: "infra.yml".to_string(),
            compose_file: "compose.yml".to_string(),
            validator: vec!["docker".to_string(), "compose".to_string()],
            default_env: vec![
                "PUID=1000".to_string(),
                "PGID=1000".to_string(),
                "TZ=Etc/UTC".to_string(),
            ],
            presets: PresetTable::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read settings file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }

    /// Save settings, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Could not write settings file: {}", path.display()))
    }

    /// The infrastructure file path with `~` and variables expanded.
    pub fn infra_path(&self) -> PathBuf {
        expand(&self.infra_file)
    }
}

/// Get the berth config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("berth"));
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("berth"))
}

/// Path of the settings file
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
