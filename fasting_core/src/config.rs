//! Configuration file support for Fastplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fastplan/config.toml`.

use crate::recurrence::PlanSettings;
use crate::stats::WINDOW_CHOICES;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "fastplan";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    /// Defaults for bulk planning
    #[serde(default)]
    pub planner: PlanSettings,

    #[serde(default)]
    pub stats: StatsConfig,
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

impl DataConfig {
    pub fn plan_path(&self) -> PathBuf {
        self.data_dir.join("plan.json")
    }
}

/// Statistics configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

fn home_dir_or_cwd() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir_or_cwd().join(".local/share"));
    base.join(APP_DIR)
}

fn default_window_days() -> u32 {
    7
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
    ///
    /// Planner defaults are validated so a bad config is reported up front
    /// rather than on the first bulk plan.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config
            .planner
            .validate()
            .map_err(|e| Error::Config(format!("{:?}: {}", path, e)))?;
        if !WINDOW_CHOICES.contains(&config.stats.window_days) {
            return Err(Error::Config(format!(
                "{:?}: stats.window_days must be 7 or 30, got {}",
                path, config.stats.window_days
            )));
        }
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir_or_cwd().join(".config"));
        base.join(APP_DIR).join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frequency, Protocol};
    use chrono::Weekday;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.planner.protocol, Protocol::H16);
        assert_eq!(config.planner.frequency, Frequency::Daily);
        assert_eq!(
            config.planner.days,
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
        assert_eq!(config.stats.window_days, 7);
        assert!(config.data.plan_path().ends_with("fastplan/plan.json"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.planner.protocol = Protocol::H36;
        config.stats.window_days = 30;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.planner, config.planner);
        assert_eq!(parsed.stats.window_days, 30);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[planner]
protocol = 24
frequency = "custom"
days = ["Tue", "Sat"]
time = "18:30"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.planner.protocol, Protocol::H24);
        assert_eq!(config.planner.days, vec![Weekday::Tue, Weekday::Sat]);
        assert_eq!(config.planner.time.to_string(), "18:30");
        assert_eq!(config.stats.window_days, 7);
    }

    #[test]
    fn test_invalid_planner_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[planner]\nfrequency = \"custom\"\ndays = []\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[planner]\nprotocol = 20\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn test_stats_window_must_be_offered_choice() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        for bad in ["0", "14", "200000000"] {
            std::fs::write(&path, format!("[stats]\nwindow_days = {}\n", bad)).unwrap();
            assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
        }

        std::fs::write(&path, "[stats]\nwindow_days = 30\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().stats.window_days, 30);
    }
}
