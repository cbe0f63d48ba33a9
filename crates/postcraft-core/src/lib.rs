//! Postcraft Core - Embeddable post-creation pipeline.
//!
//! Postcraft takes a user-selected image (or video) through a multi-stage
//! composer: pan it inside a fixed viewport, pick a filter, write a caption,
//! and share. Sharing bakes the crop and filter into a compressed raster,
//! uploads it to a media store and writes a post record to a repository.
//!
//! # Architecture
//!
//! The pipeline is host-agnostic. A host (UI, CLI, test) feeds events into a
//! [`PostComposer`] and renders its state:
//!
//! ```text
//! File → Ingest → Crop (pan) → Edit (filter) → Final (caption) → Share
//!                                                                  │
//!                  Decode → Crop + Filter → Encode → MediaStore → PostRepository
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use postcraft_core::{Config, IncomingFile, MediaSource, Postcraft, RecordingSurface, Size};
//!
//! #[tokio::main]
//! async fn main() -> postcraft_core::Result<()> {
//!     let postcraft = Postcraft::new(Config::load()?)?;
//!     let mut composer = postcraft.composer(RecordingSurface::new());
//!
//!     let file = IncomingFile::from_path("./beach.jpg".as_ref()).await?;
//!     composer.select_file(file, MediaSource::Picker)?;
//!     composer.layout_in(Size::new(640.0, 640.0));
//!     composer.next()?;
//!     composer.next()?;
//!     composer.type_caption("hello")?;
//!
//!     let post = composer.share(postcraft.stores()).await?;
//!     println!("Shared {}", post.id);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod types;

use std::sync::Arc;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, PostcraftError, Result};
pub use pipeline::{
    Caption, CropRegion, DragAxis, Filter, HostSurface, IncomingFile, MediaSource, PanOffset,
    Point, PointerDevice, PostComposer, RecordingSurface, Size, Stage, ViewportGeometry,
};
pub use storage::{Collaborators, MediaStore, PostRepository, StoreFactory};
pub use types::{PostRecord, Timestamp};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Postcraft entry point: configuration plus the configured collaborators.
pub struct Postcraft {
    config: Config,
    stores: Collaborators,
}

impl Postcraft {
    /// Validate `config` and build the configured media store and post
    /// repository.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let stores = StoreFactory::create(&config.storage)?;
        tracing::debug!(
            "Initializing Postcraft v{} (media: {}, posts: {})",
            VERSION,
            stores.media.name(),
            stores.posts.name()
        );
        Ok(Self { config, stores })
    }

    /// Use explicit collaborators instead of the configured ones.
    pub fn with_stores(config: Config, stores: Collaborators) -> Self {
        Self { config, stores }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stores(&self) -> &Collaborators {
        &self.stores
    }

    /// Open a new composer modal on the given host surface.
    pub fn composer<S: HostSurface + 'static>(&self, surface: Arc<S>) -> PostComposer {
        PostComposer::open(&self.config, surface)
    }

    /// Crop viewport configured for hosts without a layout engine.
    pub fn viewport(&self) -> Size {
        Size::new(self.config.viewport.width, self.config.viewport.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryMediaStore, InMemoryPostRepository};

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_postcraft_new_local() {
        let postcraft = Postcraft::new(Config::default()).unwrap();
        assert_eq!(postcraft.stores().media.name(), "local");
        assert_eq!(postcraft.viewport(), Size::new(640.0, 640.0));
    }

    #[test]
    fn test_postcraft_new_revalidates_overrides() {
        let mut config = Config::default();
        config.profile.author_id = "../elsewhere".to_string();
        let err = Postcraft::new(config).err().unwrap();
        assert!(matches!(err, PostcraftError::Config(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_composer_opens_on_surface() {
        let stores = Collaborators::new(
            Arc::new(InMemoryMediaStore::new()),
            Arc::new(InMemoryPostRepository::new()),
        );
        let postcraft = Postcraft::with_stores(Config::default(), stores);
        let surface = RecordingSurface::new();
        let composer = postcraft.composer(surface.clone());
        assert!(composer.is_open());
        assert!(surface.scroll_locked());
    }
}
