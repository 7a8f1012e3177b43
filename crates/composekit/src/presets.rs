//! Named resource presets.

use crate::error::{Error, Result};
use crate::types::ResourceLimits;
use serde::{Deserialize, Serialize};

/// Preset name that takes explicit cpu/memory values.
pub const CUSTOM: &str = "Custom";

/// Preset name meaning "no limits".
pub const NONE: &str = "None";

/// A named cpu/memory pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Preset name (e.g. "Small")
    pub name: String,
    /// CPU count
    pub cpus: String,
    /// Memory limit
    pub memory: String,
}

impl Preset {
    /// Create a preset.
    pub fn new(name: impl Into<String>, cpus: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cpus: cpus.into(),
            memory: memory.into(),
        }
    }

    /// The limits this preset applies.
    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits::new(&self.cpus, &self.memory)
    }
}

/// An ordered table of presets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetTable {
    presets: Vec<Preset>,
}

impl Default for PresetTable {
    fn default() -> Self {
        Self {
            presets: vec![
                Preset::new("Small", "0.2", "64M"),
                Preset::new("Medium", "0.5", "128M"),
                Preset::new("Big", "1", "512M"),
            ],
        }
    }
}

impl PresetTable {
    /// Create a table from presets, keeping their order.
    pub fn new(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    /// Look up a preset by exact name.
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Presets in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    /// Add a preset, replacing one with the same name in place.
    ///
    /// The reserved names `Custom` and `None` are rejected.
    pub fn upsert(&mut self, preset: Preset) -> Result<()> {
        if preset.name == CUSTOM || preset.name == NONE || preset.name.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "'{}' cannot be used as a preset name",
                preset.name
            )));
        }
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
        Ok(())
    }

    /// Remove a preset. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.presets.len();
        self.presets.retain(|p| p.name != name);
        self.presets.len() < before
    }

    /// Resolve a preset selection to limits.
    ///
    /// `None` yields no limits, `Custom` requires both `cpus` and `memory`,
    /// any other name must exist in the table.
    pub fn resolve(
        &self,
        name: &str,
        cpus: Option<&str>,
        memory: Option<&str>,
    ) -> Result<Option<ResourceLimits>> {
        match name {
            NONE => Ok(None),
            CUSTOM => {
                let cpus = cpus.map(str::trim).filter(|s| !s.is_empty());
                let memory = memory.map(str::trim).filter(|s| !s.is_empty());
                match (cpus, memory) {
                    (Some(cpus), Some(memory)) => Ok(Some(ResourceLimits::new(cpus, memory))),
                    _ => Err(Error::IncompletePreset),
                }
            }
            other => self
                .get(other)
                .map(|p| Some(p.limits()))
                .ok_or_else(|| Error::UnknownPreset(other.to_string())),
        }
    }
}
