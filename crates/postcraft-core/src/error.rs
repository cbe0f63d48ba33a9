//! Error types for the Postcraft post-creation pipeline.
//!
//! Errors are organized by stage to provide clear, actionable error messages
//! that include relevant context (file names, stage names, storage keys).

use thiserror::Error;

/// Top-level error type for Postcraft operations.
#[derive(Error, Debug)]
pub enum PostcraftError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The selected file is neither an image nor a video
    #[error("{file_name} could not be uploaded. This file is not supported.")]
    UnsupportedMediaType { file_name: String, mime: String },

    /// File exceeds size limit
    #[error("File too large: {file_name} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        file_name: String,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {file_name} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        file_name: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Image bytes could not be probed or decoded
    #[error("Decode error for {file_name}: {message}")]
    Decode { file_name: String, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// Crop + filter could not be flattened into an output buffer
    #[error("Rasterization failed: {message}")]
    Rasterization { message: String },

    /// The media store rejected or failed the upload
    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    /// The post repository failed to persist the record
    #[error("Writing post {id} failed: {message}")]
    MetadataWrite { id: String, message: String },

    /// An action was requested in a stage that does not allow it
    #[error("Cannot {action} while in the {stage} stage")]
    InvalidStage { action: String, stage: String },

    /// An action needs a media selection and none exists
    #[error("No media selected")]
    NoMedia,
}

impl PipelineError {
    /// Whether the error is shown inline and the user can simply try again
    /// (pick another file, press Share again).
    ///
    /// Collaborator failures are recoverable too, but are logged as errors
    /// because their cause lies outside the pipeline.
    pub fn is_user_recoverable(&self) -> bool {
        !matches!(
            self,
            PipelineError::Upload { .. } | PipelineError::MetadataWrite { .. }
        )
    }
}

/// Convenience type alias for Postcraft results.
pub type Result<T> = std::result::Result<T, PostcraftError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_media_message_names_file() {
        let err = PipelineError::UnsupportedMediaType {
            file_name: "notes.txt".to_string(),
            mime: "text/plain".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "notes.txt could not be uploaded. This file is not supported."
        );
    }

    #[test]
    fn test_collaborator_failures_not_user_recoverable() {
        let upload = PipelineError::Upload {
            key: "posts/a/b.jpg".to_string(),
            message: "503".to_string(),
        };
        let write = PipelineError::MetadataWrite {
            id: "abc".to_string(),
            message: "denied".to_string(),
        };
        assert!(!upload.is_user_recoverable());
        assert!(!write.is_user_recoverable());
        assert!(PipelineError::NoMedia.is_user_recoverable());
    }
}
