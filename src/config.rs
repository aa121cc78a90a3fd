use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "SetSolver";

/// Upper bound for `report_every`
pub const MAX_REPORT_EVERY: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detections below this confidence are ignored before decoding (0.0-1.0)
    pub confidence_threshold: f32,

    /// Maximum number of decoded cards searched for a set
    pub max_cards: usize,

    /// Log a latency report every N cycles (0 = never)
    pub report_every: usize,

    /// How often the idle worker re-checks for shutdown, in milliseconds
    pub idle_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            max_cards: 21,
            report_every: 100,
            idle_poll_ms: 250,
        }
    }
}

impl Config {
    /// Load configuration from the platform-specific config directory.
    /// Creates default config if file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if path.exists() {
            let config = Self::load_from(&path)?;
            tracing::info!("Loaded config from: {}", path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            tracing::info!("Created default config at: {}", path.display());
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::LoadFailed {
                path: path.display().to_string(),
                source,
            }
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: Config = serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::SaveFailed {
                path: path.display().to_string(),
                source,
            }
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;

        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be within 0.0-1.0, got {}",
                self.confidence_threshold
            )));
        }
        if self.max_cards < 3 {
            return Err(ConfigError::Invalid(format!(
                "max_cards must be at least 3, got {}",
                self.max_cards
            )));
        }
        if self.report_every > MAX_REPORT_EVERY {
            return Err(ConfigError::Invalid(format!(
                "report_every must be at most {}, got {}",
                MAX_REPORT_EVERY, self.report_every
            )));
        }
        if self.idle_poll_ms == 0 {
            return Err(ConfigError::Invalid("idle_poll_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::app_dir()?.join("config.json"))
    }

    /// Directory holding config and logs
    pub fn app_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }
}
