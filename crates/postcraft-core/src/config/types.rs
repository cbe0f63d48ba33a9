//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Who is posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Author id written into every post record
    pub author_id: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            author_id: "anonymous".to_string(),
        }
    }
}

/// Size of the crop viewport, in display pixels.
///
/// Only used by hosts without a layout engine (the CLI). A UI host reports
/// the measured geometry of its own preview container instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Container width
    pub width: f64,

    /// Container height
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 640.0,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Full decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Crop + filter + encode timeout in milliseconds
    pub raster_timeout_ms: u64,

    /// Timeout for each collaborator call (upload, metadata write)
    pub upload_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            raster_timeout_ms: 10000,
            upload_timeout_ms: 60000,
        }
    }
}

/// Output image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output format: "jpeg" or "webp"
    pub format: String,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: "jpeg".to_string(),
            quality: 92,
        }
    }
}

/// Where finished posts go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend: "local" (filesystem) or "remote" (HTTP)
    pub backend: String,

    /// Directory for uploaded media when using the local backend
    pub media_dir: String,

    /// JSON Lines file receiving post records when using the local backend
    pub posts_file: String,

    /// Prefix of every media destination key
    pub key_prefix: String,

    /// HTTP endpoints for the remote backend
    pub remote: Option<RemoteStorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            media_dir: "~/.postcraft/media".to_string(),
            posts_file: "~/.postcraft/posts.jsonl".to_string(),
            key_prefix: "posts".to_string(),
            remote: None,
        }
    }
}

impl StorageConfig {
    /// Resolved media directory (with ~ expansion).
    pub fn media_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.media_dir).into_owned())
    }

    /// Resolved posts file (with ~ expansion).
    pub fn posts_file(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.posts_file).into_owned())
    }
}

/// Remote object store and document endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStorageConfig {
    /// Objects are PUT to `{media_endpoint}/{key}`
    pub media_endpoint: String,

    /// Post records are POSTed here as JSON
    pub posts_endpoint: String,

    /// Public URL prefix for uploaded objects
    pub public_base_url: String,

    /// Bearer token (supports ${ENV_VAR} syntax)
    pub api_key: String,
}

impl Default for RemoteStorageConfig {
    fn default() -> Self {
        Self {
            media_endpoint: "http://localhost:9000/media".to_string(),
            posts_endpoint: "http://localhost:9000/posts".to_string(),
            public_base_url: "http://localhost:9000/media".to_string(),
            api_key: "${POSTCRAFT_STORE_TOKEN}".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
