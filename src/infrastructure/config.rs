use crate::domain::{
    config::RelayConfig,
    error::{RelayError, RelayResult},
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    default_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> Self {
        Self {
            default_path: Self::get_default_config_path(),
        }
    }

    /// Manager that reads its default file from `path`
    pub fn with_default_path(path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: Some(path.into()),
        }
    }

    /// Load the explicitly requested file, or the default file if present.
    pub fn load_config(&self, explicit: Option<&Path>) -> RelayResult<RelayConfig> {
        if let Some(path) = explicit {
            return self.load_config_from_path(path);
        }
        match &self.default_path {
            Some(path) if path.exists() => self.load_config_from_path(path),
            _ => Ok(RelayConfig::default()),
        }
    }

    /// Default configuration path, `~/.config/serelay/config.toml`
    fn get_default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("serelay").join("config.toml"))
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> RelayResult<RelayConfig> {
        let content = fs::read_to_string(path).map_err(|e| RelayError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        debug!("Loaded configuration from {}", path.display());
        toml::from_str(&content).map_err(|e| RelayError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    pub fn default_path(&self) -> Option<&Path> {
        self.default_path.as_deref()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
