use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, loaded from `roadcase.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

/// Knobs for availability checks and the auto-assign planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Buffer applied around candidate windows when the caller does not
    /// pass one explicitly.
    #[serde(default = "default_buffer_days")]
    pub default_buffer_days: i64,
    /// Gap between consecutive bookings of one kit below which the planner
    /// emits a tight-turnaround warning.
    #[serde(default = "default_tight_turnaround_days")]
    pub tight_turnaround_days: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_buffer_days: default_buffer_days(),
            tight_turnaround_days: default_tight_turnaround_days(),
        }
    }
}

/// Load configuration from `<root>/roadcase.toml`, falling back to defaults
/// when the file does not exist.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_config(root: &Path) -> Result<FleetConfig> {
    let path = root.join("roadcase.toml");
    if !path.exists() {
        return Ok(FleetConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<FleetConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_buffer_days() -> i64 {
    3
}

const fn default_tight_turnaround_days() -> i64 {
    10
}
