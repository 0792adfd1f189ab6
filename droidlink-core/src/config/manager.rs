//! Loading and saving `config.toml`

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

use super::settings::AppSettings;

/// Settings file name inside the configuration directory
pub const SETTINGS_FILE: &str = "config.toml";

/// Reads and writes [`AppSettings`] in a configuration directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses `<platform config dir>/droidlink`
    ///
    /// # Errors
    /// Returns [`ConfigError::NoConfigDir`] if the platform has no config dir
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_config_dir(base.join("droidlink")))
    }

    /// Uses an explicit configuration directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Configuration directory in use
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Loads settings; a missing file yields defaults
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        let path = self.settings_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(AppSettings::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path,
            message: e.to_string(),
        })
    }

    /// Writes settings, creating the directory if needed
    ///
    /// # Errors
    /// Returns an error if serialization or any file operation fails
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        std::fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;

        let content =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        let path = self.settings_path();
        std::fs::write(&path, content).map_err(|source| ConfigError::Io { path, source })?;
        tracing::info!(path = %self.settings_path().display(), "Settings saved");
        Ok(())
    }
}
