//! Configuration file support for SetLog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/setlog/config.toml`.

use crate::session::SessionSettings;
use crate::{Error, ExerciseType, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
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

/// Whose plans the front end works with
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

/// Live session timing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_lead_in_seconds")]
    pub lead_in_seconds: u32,

    #[serde(default = "default_rest_alert_seconds")]
    pub rest_alert_seconds: u32,

    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lead_in_seconds: default_lead_in_seconds(),
            rest_alert_seconds: default_rest_alert_seconds(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        let tick_millis = i64::try_from(config.tick_millis.max(1)).unwrap_or(1000);
        SessionSettings {
            lead_in_seconds: config.lead_in_seconds,
            rest_alert_seconds: config.rest_alert_seconds,
            tick: chrono::Duration::milliseconds(tick_millis),
        }
    }
}

/// Schedule lookups
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            lookahead_days: default_lookahead_days(),
        }
    }
}

/// User-defined exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomExercise {
    pub id: String,
    pub name: String,
    pub kind: ExerciseType,
}

/// Exercise catalog extensions
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub custom: Vec<CustomExercise>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("setlog")
}

fn default_user_id() -> String {
    "local".into()
}

fn default_lead_in_seconds() -> u32 {
    3
}

fn default_rest_alert_seconds() -> u32 {
    3
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_lookahead_days() -> u32 {
    crate::schedule::DEFAULT_LOOKAHEAD_DAYS
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
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the session cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.user.id.trim().is_empty() {
            return Err(Error::Config("user.id must not be empty".into()));
        }
        if self.session.tick_millis == 0 {
            return Err(Error::Config("session.tick_millis must be positive".into()));
        }
        if self.schedule.lookahead_days == 0 {
            return Err(Error::Config(
                "schedule.lookahead_days must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("setlog").join("config.toml")
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

    /// Session timing derived from the `[session]` table
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::from(&self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.user.id, "local");
        assert_eq!(config.session.lead_in_seconds, 3);
        assert_eq!(config.session.rest_alert_seconds, 3);
        assert_eq!(config.schedule.lookahead_days, 14);
        assert!(config.catalog.custom.is_empty());
        assert_eq!(config.session_settings(), SessionSettings::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.catalog.custom.push(CustomExercise {
            id: "ring_support".into(),
            name: "Ring Support Hold".into(),
            kind: ExerciseType::Static,
        });
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.catalog.custom, config.catalog.custom);
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[session]
lead_in_seconds = 5
tick_millis = 250
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session.lead_in_seconds, 5);
        assert_eq!(config.session.rest_alert_seconds, 3); // default
        assert_eq!(
            config.session_settings().tick,
            chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[schedule]\nlookahead_days = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
