//! Post-creation pipeline components.
//!
//! This module contains every stage of the post-creation flow:
//! - **geometry**: Pan clamping, crop mapping and preview layout (pure math)
//! - **filter**: The filter catalog, as preview CSS and as pixel operations
//! - **stage**: The Upload → Crop → Edit → Final → Submitting state machine
//! - **ingest**: Validation of picked and dropped files
//! - **surface**: Scoped global listeners and the scroll lock
//! - **drag**: Pointer-driven panning during Crop
//! - **caption**: Bounded caption text and the emoji picker
//! - **decode**: Full image decode off the async executor
//! - **raster**: Crop + filter + encode at export time
//! - **composer**: Orchestrates all of the above behind one event API

pub mod caption;
pub mod composer;
pub mod decode;
pub mod drag;
pub mod filter;
pub mod geometry;
pub mod ingest;
pub mod raster;
pub mod stage;
pub mod surface;

// Re-exports for convenient access
pub use caption::{Caption, EMOJI_PALETTE, MAX_CAPTION_CHARS};
pub use composer::{PostComposer, SubmitJob};
pub use decode::ImageDecoder;
pub use drag::{DragController, PointerDevice};
pub use filter::{Filter, FilterOp};
pub use geometry::{
    alignment_grid, clamp_pan, compute_crop_region, cover_layout, Clamped, CropRegion, DragAxis,
    PanOffset, PixelRect, Point, Size, ViewportGeometry,
};
pub use ingest::{mime_from_path, IncomingFile, Ingestor, MediaKind, MediaSelection, MediaSource};
pub use raster::{rasterize, EncodedImage, ExportFormat, Rasterizer};
pub use stage::{
    BackOutcome, CloseOutcome, DiscardEffect, DiscardIntent, HeaderControls, Stage, StageMachine,
};
pub use surface::{
    HostSurface, ListenerId, ListenerKind, ModalSession, RecordingSurface, ScrollLock,
    Subscription,
};
