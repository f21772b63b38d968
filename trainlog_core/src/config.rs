//! Configuration file support for trainlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/trainlog/config.toml`.
//! Every section and key is optional.

use crate::interval::IntervalConfig;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub interval: IntervalConfig,

    #[serde(default)]
    pub progression: ProgressionConfig,

    #[serde(default)]
    pub plan: PlanConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Timer and week-numbering defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rest countdown used when a fresh state is created
    #[serde(default = "default_rest_seconds")]
    pub rest_default_seconds: u32,

    #[serde(default = "default_auto_start_rest")]
    pub auto_start_rest: bool,

    /// Day one of training week 1
    #[serde(default = "default_epoch_anchor")]
    pub epoch_anchor: NaiveDate,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rest_default_seconds: default_rest_seconds(),
            auto_start_rest: default_auto_start_rest(),
            epoch_anchor: default_epoch_anchor(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Progression parameters configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default = "default_tempo_base_minutes")]
    pub tempo_base_minutes: u32,

    #[serde(default = "default_long_run_base_minutes")]
    pub long_run_base_minutes: u32,

    #[serde(default = "default_bilateral_increment")]
    pub bilateral_increment: f64,

    #[serde(default = "default_unilateral_increment")]
    pub unilateral_increment: f64,

    #[serde(default = "default_deload_speed_bump")]
    pub deload_speed_bump: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            tempo_base_minutes: default_tempo_base_minutes(),
            long_run_base_minutes: default_long_run_base_minutes(),
            bilateral_increment: default_bilateral_increment(),
            unilateral_increment: default_unilateral_increment(),
            deload_speed_bump: default_deload_speed_bump(),
        }
    }
}

/// Optional custom plan file
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PlanConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("trainlog")
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_auto_start_rest() -> bool {
    true
}

fn default_epoch_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default()
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_tempo_base_minutes() -> u32 {
    12
}

fn default_long_run_base_minutes() -> u32 {
    45
}

fn default_bilateral_increment() -> f64 {
    2.5
}

fn default_unilateral_increment() -> f64 {
    1.0
}

fn default_deload_speed_bump() -> f64 {
    0.2
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.check()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that cannot be clamped into something sensible
    fn check(&self) -> Result<()> {
        if self.engine.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".into()));
        }
        let p = &self.progression;
        for (name, value) in [
            ("bilateral_increment", p.bilateral_increment),
            ("unilateral_increment", p.unilateral_increment),
            ("deload_speed_bump", p.deload_speed_bump),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("trainlog").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
