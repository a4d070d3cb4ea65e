//! Configuration manager for loading and saving configuration
//!
//! Configuration lives in %APPDATA%\instutils\config.json. Writes go through a
//! temporary file in the same directory that is then renamed over the target.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::models::UtilsConfig;
use crate::error::{Result, StringError, UtilsError};

/// Directory name under %APPDATA%
pub const APP_DIR_NAME: &str = "instutils";

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Directory holding configuration and logs
    ///
    /// Returns: %APPDATA%\instutils
    pub fn app_dir() -> PathBuf {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join(APP_DIR_NAME)
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> PathBuf {
        Self::app_dir().join("config.json")
    }

    /// Load configuration from the default location
    pub fn load() -> Result<UtilsConfig> {
        Self::load_from(&Self::get_config_path())
    }

    /// Load configuration from `path`
    ///
    /// A missing or corrupt file yields the default configuration.
    pub fn load_from(path: &Path) -> Result<UtilsConfig> {
        if !path.exists() {
            info!("Configuration file not found, using defaults");
            return Ok(UtilsConfig::default());
        }

        let json = std::fs::read_to_string(path)?;
        match serde_json::from_str::<UtilsConfig>(&json) {
            Ok(config) => {
                info!("Configuration loaded from {}", path.display());
                Ok(config.normalized())
            }
            Err(e) => {
                warn!("Failed to parse configuration, using defaults: {}", e);
                Ok(UtilsConfig::default())
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(config: &UtilsConfig) -> Result<()> {
        Self::save_to(&Self::get_config_path(), config)
    }

    /// Save configuration to `path` atomically
    pub fn save_to(path: &Path, config: &UtilsConfig) -> Result<()> {
        let dir = path.parent().ok_or_else(|| {
            UtilsError::ConfigError(StringError::new(format!(
                "Invalid config path: {}",
                path.display()
            )))
        })?;
        std::fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(temp.as_file_mut(), config)?;
        temp.persist(path).map_err(|e| UtilsError::IoError(e.error))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{AppdataGuard, create_test_dir};

    #[test]
    fn test_config_path() {
        let path = ConfigManager::get_config_path();
        assert!(path.to_string_lossy().contains(APP_DIR_NAME));
        assert!(path.to_string_lossy().ends_with("config.json"));
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = create_test_dir();
        let config = ConfigManager::load_from(&temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(config, UtilsConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("nested").join("config.json");
        let config = UtilsConfig {
            verbose: true,
            initial_build_step: 512,
        };

        ConfigManager::save_to(&path, &config).unwrap();
        assert_eq!(ConfigManager::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_corrupt_config_falls_back_to_defaults() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(
            ConfigManager::load_from(&path).unwrap(),
            UtilsConfig::default()
        );
    }

    #[test]
    fn test_default_location_follows_appdata() {
        let temp_dir = create_test_dir();
        let _guard = AppdataGuard::new(&temp_dir);

        let config = UtilsConfig {
            verbose: false,
            initial_build_step: 1024,
        };
        ConfigManager::save(&config).unwrap();

        assert!(temp_dir.path().join(APP_DIR_NAME).join("config.json").exists());
        assert_eq!(ConfigManager::load().unwrap(), config);
    }
}
