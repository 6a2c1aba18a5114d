use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;

/// A user-editable configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SettingField {
    #[strum(to_string = "update interval (ms)")]
    UpdateIntervalMs,
    #[strum(to_string = "idle threshold (s)")]
    IdleThresholdSecs,
    #[strum(to_string = "stop threshold (s)")]
    StopThresholdSecs,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field}: {input:?} is not a whole number")]
    NotANumber { field: SettingField, input: String },

    #[error("{field} must be greater than zero")]
    NonPositive { field: SettingField },

    #[error("stop threshold ({stop}s) must be greater than idle threshold ({idle}s)")]
    ThresholdOrder { idle: u64, stop: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub update_interval_ms: u64,
    pub idle_threshold_secs: u64,
    pub stop_threshold_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_interval_ms: 1000,
            idle_threshold_secs: 10,
            stop_threshold_secs: 120,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: SettingField::UpdateIntervalMs,
            });
        }
        if self.idle_threshold_secs == 0 {
            return Err(ConfigError::NonPositive {
                field: SettingField::IdleThresholdSecs,
            });
        }
        if self.stop_threshold_secs <= self.idle_threshold_secs {
            return Err(ConfigError::ThresholdOrder {
                idle: self.idle_threshold_secs,
                stop: self.stop_threshold_secs,
            });
        }
        Ok(())
    }

    /// Apply a raw user-entered value. On error nothing changes.
    pub fn set(&mut self, field: SettingField, input: &str) -> Result<(), ConfigError> {
        let trimmed = input.trim();
        let value: i64 = trimmed.parse().map_err(|_| ConfigError::NotANumber {
            field,
            input: input.to_string(),
        })?;
        if value <= 0 {
            return Err(ConfigError::NonPositive { field });
        }
        let value = value as u64;

        let mut candidate = *self;
        match field {
            SettingField::UpdateIntervalMs => candidate.update_interval_ms = value,
            SettingField::IdleThresholdSecs => candidate.idle_threshold_secs = value,
            SettingField::StopThresholdSecs => candidate.stop_threshold_secs = value,
        }
        candidate.validate()?;

        *self = candidate;
        Ok(())
    }

    /// Tick period in seconds
    pub fn tick_secs(&self) -> f64 {
        self.update_interval_ms as f64 / 1000.0
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("penpace_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };

        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => match cfg.validate() {
                Ok(()) => cfg,
                Err(e) => {
                    log::warn!("ignoring stored config {}: {e}", self.path.display());
                    Config::default()
                }
            },
            Err(e) => {
                log::warn!("could not parse config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        cfg.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
