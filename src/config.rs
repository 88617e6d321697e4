//! Operator configuration
//!
//! Loaded from an optional YAML file, then overridden from the environment.

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the field manager
pub const ENV_FIELD_MANAGER: &str = "APPFLOW_FIELD_MANAGER";

/// Environment variable overriding the requeue interval (seconds)
pub const ENV_REQUEUE_SECS: &str = "APPFLOW_REQUEUE_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Server-side apply field manager
    pub field_manager: String,

    /// Take ownership of fields managed by someone else
    pub force_apply: bool,

    /// Delay between passes while a step is still running
    pub requeue_interval_secs: u64,

    /// Give up after this many passes; unbounded when unset
    pub max_passes: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            field_manager: appflow_workflow::DEFAULT_FIELD_MANAGER.to_string(),
            force_apply: true,
            requeue_interval_secs: 5,
            max_passes: None,
        }
    }
}

impl Config {
    /// Load from `path` (defaults when `None`) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
                Self::from_yaml(&raw)
                    .wrap_err_with(|| format!("Invalid config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty document means "all defaults"
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply overrides looked up through `lookup`
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(field_manager) = lookup(ENV_FIELD_MANAGER) {
            self.field_manager = field_manager;
        }
        if let Some(secs) = lookup(ENV_REQUEUE_SECS) {
            self.requeue_interval_secs = secs
                .parse()
                .wrap_err_with(|| format!("{} must be a number of seconds", ENV_REQUEUE_SECS))?;
        }
        Ok(self)
    }

    pub fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_interval_secs)
    }
}
