//! Watcher configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Command-line flags override whatever the file says.

use crate::game::{OutputFormat, VerbosityLevel};
use crate::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// When the state-changed notification fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// On every tick while the state is stable (default)
    #[default]
    Level,
    /// Once per transition into stability
    Edge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period before the state counts as stable
    pub debounce_ms: u64,

    /// Polling cadence used by the `hswatch` binary
    pub tick_interval_ms: u64,

    pub notify: NotifyMode,

    pub verbosity: VerbosityLevel,

    /// Format of the watcher's own log lines on stdout
    pub log_format: OutputFormat,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            debounce_ms: 100,
            tick_interval_ms: 50,
            notify: NotifyMode::default(),
            verbosity: VerbosityLevel::default(),
            log_format: OutputFormat::default(),
        }
    }
}

impl WatchConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: WatchConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(WatchError::InvalidConfig(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
