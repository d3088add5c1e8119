//! Image decoding and the fixed normalization applied before upload.
//!
//! Every image sent to the vision backend is stretched to exactly
//! `NORMALIZED_EDGE` x `NORMALIZED_EDGE` (no letterboxing), converted to RGB,
//! JPEG-encoded and base64-encoded.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::error::BackendError;

/// Edge length of the square frame the vision backend expects.
pub const NORMALIZED_EDGE: u32 = 512;

const JPEG_QUALITY: u8 = 95;

/// A decoded image ready to be attached to a backend request.
#[derive(Debug, Clone)]
pub struct ImageInput {
    image: DynamicImage,
}

impl ImageInput {
    /// Decode raw upload bytes (JPEG, PNG, GIF, BMP or WebP).
    pub fn decode(bytes: &[u8]) -> Result<Self, BackendError> {
        if bytes.is_empty() {
            return Err(BackendError::Decode("empty image data".to_string()));
        }
        let image = image::load_from_memory(bytes)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Self { image })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Source dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// The image stretched to the normalized frame, as RGB.
    pub fn normalized(&self) -> RgbImage {
        self.image
            .resize_exact(NORMALIZED_EDGE, NORMALIZED_EDGE, FilterType::Triangle)
            .to_rgb8()
    }

    /// Normalize, JPEG-encode and base64-encode for the request payload.
    pub fn to_jpeg_base64(&self) -> Result<String, BackendError> {
        let rgb = self.normalized();
        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
        rgb.write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(BASE64.encode(buffer.into_inner()))
    }
}
