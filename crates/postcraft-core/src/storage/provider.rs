//! Collaborator traits and the factory that builds them from config.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{ConfigError, PipelineError};
use crate::types::PostRecord;

/// Object store receiving finished media.
///
/// Uses `async_trait` because the pipeline holds stores as `Arc<dyn MediaStore>`.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store name for logging (e.g., "local", "http").
    fn name(&self) -> &str;

    /// Store `bytes` under `key` and return a URL it can be fetched from.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, PipelineError>;
}

/// Persistence for post metadata.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Repository name for logging.
    fn name(&self) -> &str;

    /// Persist a new post. The record's id is already allocated.
    async fn create(&self, record: &PostRecord) -> Result<(), PipelineError>;
}

/// The pair of collaborators a submission writes to.
#[derive(Clone)]
pub struct Collaborators {
    pub media: Arc<dyn MediaStore>,
    pub posts: Arc<dyn PostRepository>,
}

impl Collaborators {
    pub fn new(media: Arc<dyn MediaStore>, posts: Arc<dyn PostRepository>) -> Self {
        Self { media, posts }
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Builds the configured collaborators.
pub struct StoreFactory;

impl StoreFactory {
    /// Create the media store and post repository for `storage.backend`.
    ///
    /// # Arguments
    /// * `storage` - The `[storage]` config section
    pub fn create(storage: &StorageConfig) -> Result<Collaborators, ConfigError> {
        match storage.backend.as_str() {
            "local" => Ok(Collaborators::new(
                Arc::new(super::local::LocalMediaStore::new(storage.media_dir())),
                Arc::new(super::local::JsonlPostRepository::new(storage.posts_file())),
            )),
            "remote" => {
                let cfg = storage.remote.clone().ok_or_else(|| {
                    ConfigError::ValidationError(
                        "storage.backend = \"remote\" requires a [storage.remote] section".into(),
                    )
                })?;
                let token = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    ConfigError::ValidationError(format!(
                        "Remote store token not set (storage.remote.api_key = \"{}\")",
                        cfg.api_key
                    ))
                })?;
                Ok(Collaborators::new(
                    Arc::new(super::http::HttpMediaStore::new(
                        &cfg.media_endpoint,
                        &cfg.public_base_url,
                        &token,
                    )),
                    Arc::new(super::http::HttpPostRepository::new(
                        &cfg.posts_endpoint,
                        &token,
                    )),
                ))
            }
            other => Err(ConfigError::ValidationError(format!(
                "Unknown storage backend: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteStorageConfig;

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_POSTCRAFT_987}"), None);
    }

    #[test]
    fn test_factory_local() {
        let stores = StoreFactory::create(&StorageConfig::default()).unwrap();
        assert_eq!(stores.media.name(), "local");
        assert_eq!(stores.posts.name(), "jsonl");
    }

    #[test]
    fn test_factory_remote() {
        let storage = StorageConfig {
            backend: "remote".to_string(),
            remote: Some(RemoteStorageConfig {
                api_key: "literal-token".to_string(),
                ..RemoteStorageConfig::default()
            }),
            ..StorageConfig::default()
        };
        let stores = StoreFactory::create(&storage).unwrap();
        assert_eq!(stores.media.name(), "http");
        assert_eq!(stores.posts.name(), "http");
    }

    #[test]
    fn test_factory_remote_without_token() {
        let storage = StorageConfig {
            backend: "remote".to_string(),
            remote: Some(RemoteStorageConfig {
                api_key: "${DEFINITELY_NOT_SET_POSTCRAFT_987}".to_string(),
                ..RemoteStorageConfig::default()
            }),
            ..StorageConfig::default()
        };
        let err = StoreFactory::create(&storage).err().unwrap();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_factory_unknown_backend() {
        let storage = StorageConfig {
            backend: "ftp".to_string(),
            ..StorageConfig::default()
        };
        assert!(StoreFactory::create(&storage).is_err());
    }
}
