//! Bounded resize and quality-ladder JPEG re-encoding.

use crate::ImagingError;
use advisor_types::DataUrl;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbImage;

/// Neither output dimension exceeds this.
pub const MAX_DIMENSION: u32 = 800;
/// Byte budget for the encoded JPEG, sized so the base64 data URL fits a
/// roughly one-megabyte storage slot.
pub const TARGET_BYTES: usize = 900 * 1024;
/// Initial JPEG quality in percent.
pub const QUALITY_START: u8 = 70;
/// Quality is never reduced below this.
pub const QUALITY_FLOOR: u8 = 20;
/// Quality reduction per re-encode.
pub const QUALITY_STEP: u8 = 10;

/// Result of a compression run, with diagnostics for logging and for the
/// ingestion endpoint's response.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data_url: DataUrl,
    /// Final JPEG quality in percent
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    /// Encoded JPEG size in bytes, before base64 expansion
    pub bytes: usize,
}

impl CompressedImage {
    /// Whether the encoded size ended up under the configured budget.
    ///
    /// `false` means the quality floor was reached first; the result is still
    /// usable but may be rejected by a capacity-limited store.
    pub fn under_budget(&self, target_bytes: usize) -> bool {
        self.bytes <= target_bytes
    }
}

/// Adaptive compressor with a fixed bounding dimension and byte budget.
///
/// The defaults are the production contract; tests narrow the budget to force
/// the quality ladder to walk.
#[derive(Debug, Clone)]
pub struct ImageCompressor {
    max_dimension: u32,
    target_bytes: usize,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            target_bytes: TARGET_BYTES,
        }
    }
}

impl ImageCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the byte budget. Used by tests and callers with tighter
    /// storage slots.
    pub fn with_target_bytes(mut self, target_bytes: usize) -> Self {
        self.target_bytes = target_bytes;
        self
    }

    pub fn target_bytes(&self) -> usize {
        self.target_bytes
    }

    /// Compresses raw image bytes (any format the codec understands) into a
    /// JPEG data URL.
    ///
    /// # Errors
    /// `ImagingError::Decode` if the input is not a decodable image;
    /// `ImagingError::Encode` if JPEG encoding fails.
    pub fn compress(&self, input: &[u8]) -> Result<CompressedImage, ImagingError> {
        let decoded = image::load_from_memory(input).map_err(ImagingError::Decode)?;

        // No upscaling: only shrink when a dimension exceeds the bound.
        let resized = if decoded.width() > self.max_dimension
            || decoded.height() > self.max_dimension
        {
            decoded.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            decoded
        };
        let rgb = resized.to_rgb8();

        let mut quality = QUALITY_START;
        let mut encoded = encode_jpeg(&rgb, quality)?;
        while encoded.len() > self.target_bytes && quality > QUALITY_FLOOR {
            quality -= QUALITY_STEP;
            encoded = encode_jpeg(&rgb, quality)?;
        }
        // Over budget at the floor is accepted; the store decides.

        let data_url = DataUrl::from_base64("image/jpeg", &STANDARD.encode(&encoded))?;

        Ok(CompressedImage {
            data_url,
            quality,
            width: rgb.width(),
            height: rgb.height(),
            bytes: encoded.len(),
        })
    }

    /// Compresses an image already wrapped in a data URL, e.g. one captured
    /// and pre-encoded by a client.
    pub fn compress_data_url(&self, input: &DataUrl) -> Result<CompressedImage, ImagingError> {
        let raw = STANDARD.decode(input.payload_base64())?;
        self.compress(&raw)
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(image).map_err(ImagingError::Encode)?;
    Ok(buf)
}
