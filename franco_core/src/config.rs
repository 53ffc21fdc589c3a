//! Configuration file support for Franco Assistant.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/franco/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub rewards: RewardsConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub shields: ShieldsConfig,
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

/// XP granted by the different subsystems
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// XP for logging the daily metric of a pillar
    #[serde(default = "default_metric_xp")]
    pub metric_xp: i64,

    #[serde(default = "default_shield_xp_per_day")]
    pub default_shield_xp_per_day: i64,

    #[serde(default = "default_event_xp")]
    pub default_event_xp: i64,

    #[serde(default = "default_objective_xp")]
    pub default_objective_xp: i64,

    #[serde(default = "default_task_xp")]
    pub default_task_xp: i64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            metric_xp: default_metric_xp(),
            default_shield_xp_per_day: default_shield_xp_per_day(),
            default_event_xp: default_event_xp(),
            default_objective_xp: default_objective_xp(),
            default_task_xp: default_task_xp(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Shield defaults. `notifications` is stored on new shields but nothing
/// reads it yet.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ShieldsConfig {
    #[serde(default)]
    pub notifications: bool,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("franco")
}

fn default_metric_xp() -> i64 {
    5
}

fn default_shield_xp_per_day() -> i64 {
    50
}

fn default_event_xp() -> i64 {
    10
}

fn default_objective_xp() -> i64 {
    25
}

fn default_task_xp() -> i64 {
    10
}

fn default_page_size() -> usize {
    20
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that would make rewards or paging meaningless
    pub fn validate(&self) -> Result<()> {
        let rewards = &self.rewards;
        if rewards.metric_xp < 0 {
            return Err(Error::Config("rewards.metric_xp must be >= 0".into()));
        }
        if !(1..=500).contains(&rewards.default_shield_xp_per_day) {
            return Err(Error::Config(
                "rewards.default_shield_xp_per_day must be within 1..=500".into(),
            ));
        }
        if !(1..=1000).contains(&rewards.default_event_xp)
            || !(1..=1000).contains(&rewards.default_objective_xp)
        {
            return Err(Error::Config(
                "event and objective XP defaults must be within 1..=1000".into(),
            ));
        }
        if !(0..=500).contains(&rewards.default_task_xp) {
            return Err(Error::Config(
                "rewards.default_task_xp must be within 0..=500".into(),
            ));
        }
        if !(1..=crate::history::MAX_PAGE_SIZE).contains(&self.history.page_size) {
            return Err(Error::Config(format!(
                "history.page_size must be within 1..={}",
                crate::history::MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("franco").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
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
