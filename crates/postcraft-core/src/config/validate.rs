//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    ///
    /// Called on load; hosts that override values afterwards call it again.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let author = self.profile.author_id.as_str();
        if author.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "profile.author_id must not be empty".into(),
            ));
        }
        // The author id is one segment of every media destination key
        if author.contains(|c| matches!(c, '/' | '\\')) || author == "." || author == ".." {
            return Err(ConfigError::ValidationError(format!(
                "profile.author_id must be a single path segment, got \"{author}\""
            )));
        }
        if self.storage.key_prefix.starts_with('/')
            || self.storage.key_prefix.split('/').any(|s| s == "." || s == "..")
        {
            return Err(ConfigError::ValidationError(format!(
                "storage.key_prefix must be relative without . or .. segments, got \"{}\"",
                self.storage.key_prefix
            )));
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(ConfigError::ValidationError(
                "viewport.width and viewport.height must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0
            || self.limits.raster_timeout_ms == 0
            || self.limits.upload_timeout_ms == 0
        {
            return Err(ConfigError::ValidationError(
                "limits timeouts (decode/raster/upload) must be > 0".into(),
            ));
        }
        if self.export.quality == 0 || self.export.quality > 100 {
            return Err(ConfigError::ValidationError(
                "export.quality must be between 1 and 100".into(),
            ));
        }
        if !matches!(self.export.format.as_str(), "jpeg" | "jpg" | "webp") {
            return Err(ConfigError::ValidationError(format!(
                "export.format must be \"jpeg\" or \"webp\", got \"{}\"",
                self.export.format
            )));
        }
        match self.storage.backend.as_str() {
            "local" => {}
            "remote" => {
                if self.storage.remote.is_none() {
                    return Err(ConfigError::ValidationError(
                        "storage.backend = \"remote\" requires a [storage.remote] section".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "storage.backend must be \"local\" or \"remote\", got \"{other}\""
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_author() {
        let mut config = Config::default();
        config.profile.author_id = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("author_id"));
    }

    #[test]
    fn test_validate_rejects_author_outside_one_segment() {
        for author in ["a/b", "..", "../x", "c\\d"] {
            let mut config = Config::default();
            config.profile.author_id = author.to_string();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("single path segment"), "{author}");
        }
    }

    #[test]
    fn test_validate_rejects_escaping_key_prefix() {
        for prefix in ["/abs", "posts/../..", "./posts"] {
            let mut config = Config::default();
            config.storage.key_prefix = prefix.to_string();
            assert!(config.validate().is_err(), "{prefix}");
        }
    }

    #[test]
    fn test_validate_rejects_zero_viewport() {
        let mut config = Config::default();
        config.viewport.height = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("viewport"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.raster_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeouts"));
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let mut config = Config::default();
        config.export.format = "svg".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("export.format"));
    }

    #[test]
    fn test_validate_remote_needs_section() {
        let mut config = Config::default();
        config.storage.backend = "remote".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[storage.remote]"));

        config.storage.backend = "ftp".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("storage.backend"));
    }
}
