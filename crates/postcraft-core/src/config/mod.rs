//! Configuration management for Postcraft.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Postcraft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Posting identity
    pub profile: ProfileConfig,

    /// Crop viewport used by headless hosts
    pub viewport: ViewportConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output image settings
    pub export: ExportConfig,

    /// Media store and post repository settings
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.postcraft.postcraft/config.toml
    /// - Linux: ~/.config/postcraft/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\postcraft\config\config.toml
    ///
    /// Falls back to ~/.postcraft/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "postcraft", "postcraft")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".postcraft").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.profile.author_id, "anonymous");
        assert_eq!(config.export.quality, 92);
        assert_eq!(config.limits.max_file_size_mb, 100);
        assert_eq!(config.storage.backend, "local");
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[profile]"));
        assert!(toml.contains("[export]"));
        assert!(toml.contains("[storage]"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[export]\nquality = 70\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.export.quality, 70);
        assert_eq!(config.export.format, "jpeg");
        assert_eq!(config.viewport.width, 640.0);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[export]\nquality = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("export.quality"));
    }

    #[test]
    fn test_remote_section_parses() {
        let toml = r#"
            [storage]
            backend = "remote"

            [storage.remote]
            media_endpoint = "https://store.example/objects"
            posts_endpoint = "https://store.example/posts"
            public_base_url = "https://cdn.example"
            api_key = "${STORE_TOKEN}"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let remote = config.storage.remote.unwrap();
        assert_eq!(remote.public_base_url, "https://cdn.example");
    }
}
