//! Export-time rasterization: crop, filter, encode.
//!
//! The output canvas is exactly the crop rectangle in source pixels, so the
//! crop is baked in and there is no padding. The filter runs through the same
//! operation list the live preview renders, then the canvas is serialized to
//! a compressed raster.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, GenericImageView};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{ExportConfig, LimitsConfig};
use crate::error::{PipelineError, PipelineResult};

use super::filter::Filter;
use super::geometry::CropRegion;

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg { quality: u8 },
    WebP,
}

impl ExportFormat {
    /// Read the format from config. Unknown names fall back to JPEG; config
    /// validation rejects them before this point.
    pub fn from_config(export: &ExportConfig) -> Self {
        match export.format.to_ascii_lowercase().as_str() {
            "webp" => ExportFormat::WebP,
            _ => ExportFormat::Jpeg {
                quality: export.quality.clamp(1, 100),
            },
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg { .. } => "image/jpeg",
            ExportFormat::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg { .. } => "jpg",
            ExportFormat::WebP => "webp",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Jpeg { quality } => write!(f, "jpeg (q{quality})"),
            ExportFormat::WebP => f.write_str("webp"),
        }
    }
}

/// A finished, serialized image.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

/// Crop, filter and encode synchronously.
pub fn rasterize(
    image: &DynamicImage,
    crop: CropRegion,
    filter: Filter,
    format: ExportFormat,
) -> PipelineResult<EncodedImage> {
    let (natural_w, natural_h) = image.dimensions();
    if natural_w == 0 || natural_h == 0 {
        return Err(PipelineError::Rasterization {
            message: "drawing surface cannot be acquired: source image is empty".to_string(),
        });
    }
    if !(crop.width >= 0.5 && crop.height >= 0.5) {
        return Err(PipelineError::Rasterization {
            message: format!(
                "drawing surface cannot be acquired: crop is {}x{}",
                crop.width, crop.height
            ),
        });
    }

    let rect = crop.to_pixel_rect(natural_w, natural_h);
    let mut canvas = image
        .crop_imm(rect.x, rect.y, rect.width, rect.height)
        .to_rgba8();
    filter.apply(&mut canvas);

    let mut bytes = Vec::new();
    let written = match format {
        ExportFormat::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
            DynamicImage::ImageRgb8(rgb)
                .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
        }
        ExportFormat::WebP => DynamicImage::ImageRgba8(canvas)
            .write_with_encoder(WebPEncoder::new_lossless(&mut bytes)),
    };
    written.map_err(|e| PipelineError::Rasterization {
        message: format!("serialization failed: {e}"),
    })?;

    if bytes.is_empty() {
        return Err(PipelineError::Rasterization {
            message: "serialization yielded no data".to_string(),
        });
    }

    tracing::debug!(
        "Rasterized {}x{} at ({}, {}) with {} as {} ({} bytes)",
        rect.width,
        rect.height,
        rect.x,
        rect.y,
        filter,
        format,
        bytes.len()
    );

    Ok(EncodedImage {
        bytes,
        format,
        width: rect.width,
        height: rect.height,
    })
}

/// Runs [`rasterize`] on the blocking pool with a timeout.
pub struct Rasterizer {
    format: ExportFormat,
    timeout_ms: u64,
}

impl Rasterizer {
    pub fn new(export: &ExportConfig, limits: &LimitsConfig) -> Self {
        Self {
            format: ExportFormat::from_config(export),
            timeout_ms: limits.raster_timeout_ms,
        }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub async fn rasterize(
        &self,
        image: Arc<DynamicImage>,
        crop: CropRegion,
        filter: Filter,
    ) -> PipelineResult<EncodedImage> {
        let format = self.format;
        let result = timeout(
            Duration::from_millis(self.timeout_ms),
            tokio::task::spawn_blocking(move || rasterize(&image, crop, filter, format)),
        )
        .await;

        match result {
            Ok(Ok(encoded)) => encoded,
            Ok(Err(e)) => Err(PipelineError::Rasterization {
                message: format!("Task join error: {e}"),
            }),
            Err(_) => Err(PipelineError::Timeout {
                stage: "rasterize".to_string(),
                timeout_ms: self.timeout_ms,
            }),
        }
    }
}
