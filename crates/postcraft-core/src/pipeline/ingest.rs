//! Validation of user-supplied media files.
//!
//! The file picker and drag-and-drop both funnel into [`Ingestor::accept_file`].
//! Only `image/*` and `video/*` are accepted; images additionally have their
//! natural dimensions probed from the bytes (format sniffed by content, so a
//! misnamed file still works).

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

use image::ImageDecoder as _;

use super::decode::{read_orientation, swaps_axes};
use super::geometry::{DragAxis, Size};

/// Where a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    /// Explicit file-picker selection
    Picker,
    /// Dropped onto the modal surface
    Drop,
}

/// MIME category of an accepted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// A file as handed over by the host, before validation.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self::new(name, mime_from_path(path), bytes))
    }
}

/// Best-effort MIME type from a file extension.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "heic" | "heif" => "image/heic",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

static NEXT_PREVIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle the host maps to something displayable (an object URL).
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    id: u64,
}

impl PreviewHandle {
    fn allocate() -> Self {
        Self {
            id: NEXT_PREVIEW_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn uri(&self) -> String {
        format!("blob:postcraft/{}", self.id)
    }
}

/// A validated file plus what the rest of the pipeline needs to know about it.
///
/// Dropping the selection releases its preview handle.
#[derive(Debug)]
pub struct MediaSelection {
    pub file_name: String,
    pub mime: String,
    pub kind: MediaKind,
    pub bytes: Arc<[u8]>,
    /// Natural pixel size; images only
    pub natural: Option<(u32, u32)>,
    preview: PreviewHandle,
}

impl MediaSelection {
    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    /// Natural size as floats, for geometry. Videos have none.
    pub fn natural_size(&self) -> Option<Size> {
        self.natural.map(|(w, h)| Size::from_pixels(w, h))
    }

    /// Panning axis fixed by the image's aspect ratio.
    pub fn drag_axis(&self) -> DragAxis {
        self.natural_size()
            .map(DragAxis::from_natural)
            .unwrap_or(DragAxis::None)
    }
}

/// Validates files before they become the current selection.
pub struct Ingestor {
    limits: LimitsConfig,
}

impl Ingestor {
    /// Create a new ingestor with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Validate a file and turn it into a [`MediaSelection`].
    ///
    /// Checks:
    /// - MIME type is `image/*` or `video/*`
    /// - File size is within limits
    /// - Image bytes have a recognizable format and sane dimensions
    pub fn accept_file(&self, file: IncomingFile) -> PipelineResult<MediaSelection> {
        let kind = if file.mime.starts_with("image/") {
            MediaKind::Image
        } else if file.mime.starts_with("video/") {
            MediaKind::Video
        } else {
            tracing::warn!("Rejected {} ({})", file.name, file.mime);
            return Err(PipelineError::UnsupportedMediaType {
                file_name: file.name,
                mime: file.mime,
            });
        };

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        let size = file.bytes.len() as u64;
        if size > max_bytes {
            return Err(PipelineError::FileTooLarge {
                file_name: file.name,
                size_mb: size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let natural = match kind {
            MediaKind::Image => Some(self.probe_dimensions(&file)?),
            MediaKind::Video => None,
        };

        tracing::debug!(
            "Accepted {} ({}, {} bytes, {:?})",
            file.name,
            file.mime,
            size,
            natural
        );

        Ok(MediaSelection {
            file_name: file.name,
            mime: file.mime,
            kind,
            bytes: file.bytes,
            natural,
            preview: PreviewHandle::allocate(),
        })
    }

    /// Read the image header only; the full decode happens at export time.
    ///
    /// Dimensions are the displayed ones: a quarter-turn EXIF orientation
    /// swaps width and height.
    fn probe_dimensions(&self, file: &IncomingFile) -> PipelineResult<(u32, u32)> {
        let reader = image::ImageReader::new(Cursor::new(&file.bytes[..]))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                file_name: file.name.clone(),
                message: format!("Cannot detect image format: {e}"),
            })?;
        if reader.format().is_none() {
            return Err(PipelineError::Decode {
                file_name: file.name.clone(),
                message: "Unrecognized image format".to_string(),
            });
        }
        let mut decoder = reader.into_decoder().map_err(|e| PipelineError::Decode {
            file_name: file.name.clone(),
            message: e.to_string(),
        })?;
        let (stored_w, stored_h) = decoder.dimensions();
        let (width, height) = if swaps_axes(read_orientation(&mut decoder)) {
            (stored_h, stored_w)
        } else {
            (stored_w, stored_h)
        };

        if width == 0 || height == 0 {
            return Err(PipelineError::Decode {
                file_name: file.name.clone(),
                message: "Image has no pixels".to_string(),
            });
        }
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                file_name: file.name.clone(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }
        Ok((width, height))
    }
}
