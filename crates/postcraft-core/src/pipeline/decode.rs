//! Full image decoding with timeout, off the async executor.
//!
//! Decoded images come out upright: the EXIF orientation tag is applied, as a
//! browser does for `<img>` elements.

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder as _};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with a configurable timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an in-memory image on the blocking pool.
    pub async fn decode(
        &self,
        bytes: Arc<[u8]>,
        file_name: &str,
    ) -> Result<DynamicImage, PipelineError> {
        let name = file_name.to_string();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::decode_sync(&bytes, &name)).await
        })
        .await;

        match decode_result {
            Ok(Ok(Ok(image))) => Ok(image),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(PipelineError::Decode {
                file_name: file_name.to_string(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode (runs in spawn_blocking).
    fn decode_sync(bytes: &[u8], file_name: &str) -> Result<DynamicImage, PipelineError> {
        let decode_err = |e: image::ImageError| PipelineError::Decode {
            file_name: file_name.to_string(),
            message: e.to_string(),
        };

        let mut decoder = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                file_name: file_name.to_string(),
                message: format!("Cannot detect image format: {}", e),
            })?
            .into_decoder()
            .map_err(decode_err)?;
        let orientation = read_orientation(&mut decoder);

        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        if orientation != Orientation::NoTransforms {
            tracing::debug!("Applying {orientation:?} to {file_name}");
            image.apply_orientation(orientation);
        }
        Ok(image)
    }
}

/// EXIF orientation of the image behind `decoder`; upright when absent or
/// unreadable.
pub(crate) fn read_orientation(decoder: &mut impl image::ImageDecoder) -> Orientation {
    decoder.orientation().unwrap_or(Orientation::NoTransforms)
}

/// Whether `orientation` turns the stored pixels by a quarter turn, so the
/// displayed width is the stored height.
pub(crate) fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Test fixture: a black JPEG with an EXIF APP1 segment carrying
/// `orientation` (1-8) right after the SOI marker.
#[cfg(test)]
pub(crate) fn jpeg_with_orientation(width: u32, height: u32, orientation: u8) -> Vec<u8> {
    use image::ImageFormat;

    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut encoded, ImageFormat::Jpeg)
        .unwrap();
    let encoded = encoded.into_inner();

    // Big-endian TIFF header, one IFD entry: 0x0112 SHORT x1 = orientation
    let mut tiff = vec![b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, 0x00, 0x01];
    tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    tiff.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
    tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = (payload.len() + 2) as u16;

    let mut out = encoded[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&encoded[2..]);
    out
}
