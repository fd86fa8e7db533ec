use crate::channel::DEFAULT_CHANNEL_PATH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TICK_PERIOD_MS: u64 = 100;
pub const DEFAULT_INTERFACE: &str = "enp0s3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(&'static str),
}

/// Settings shared by the relay and breaker processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub channel_path: PathBuf,
    pub tick_period_ms: u64,
    /// Display label only.
    pub interface: String,
    pub protection_logic: bool,
    /// Unset means only the channel owner releases it.
    pub release_on_exit: Option<bool>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            channel_path: PathBuf::from(DEFAULT_CHANNEL_PATH),
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            interface: DEFAULT_INTERFACE.to_string(),
            protection_logic: false,
            release_on_exit: None,
        }
    }
}

impl LinkConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: LinkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::Invalid("tick_period_ms must be greater than zero"));
        }
        if self.channel_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("channel_path must not be empty"));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Whether a process should remove the channel on exit. The publisher
    /// writes the file and owns it.
    pub fn releases_on_exit(&self, owns_channel: bool) -> bool {
        self.release_on_exit.unwrap_or(owns_channel)
    }
}
