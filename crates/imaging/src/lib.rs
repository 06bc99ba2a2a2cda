//! # Advisor Imaging
//!
//! Adaptive image compression for the tongue advisor.
//!
//! The captured tongue photo has to fit a small key-value slot (roughly a
//! megabyte) before it can be stored and later forwarded to the vision model.
//! This crate turns an arbitrary user-supplied image into a size-bounded,
//! resolution-bounded JPEG data URL:
//!
//! 1. decode the input with the platform codec
//! 2. scale so neither dimension exceeds a fixed maximum, never upscaling
//! 3. re-encode at decreasing JPEG quality until the result is under the byte
//!    budget or the quality floor is reached
//!
//! An image that is still over budget at the quality floor is accepted as-is;
//! the caller decides whether the oversized result fits its storage slot.

mod compressor;

pub use compressor::{
    CompressedImage, ImageCompressor, MAX_DIMENSION, QUALITY_FLOOR, QUALITY_START, QUALITY_STEP,
    TARGET_BYTES,
};

use advisor_types::DataUrlError;

/// Errors from decoding, encoding, or unpacking image payloads.
///
/// Decode failures are user-correctable (choose a different file); encode
/// failures are not expected in practice and surface as internal errors.
#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("invalid image data URL: {0}")]
    DataUrl(#[from] DataUrlError),
    #[error("failed to decode base64 image payload: {0}")]
    Payload(#[from] base64::DecodeError),
}
