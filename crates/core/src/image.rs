//! Image checks applied to every byte buffer before it reaches draft storage.
//!
//! Providers and the relay hand back bytes in different shapes (stored files,
//! remote URLs, inline base64). All of them go through [`normalize_image`]
//! so that a buffer is validated the same way regardless of where it came from,
//! and downsized so draft storage stays bounded.

use std::io::Cursor;

use base64::engine::general_purpose::{STANDARD as B64, STANDARD_NO_PAD as B64_NO_PAD};
use base64::Engine;
use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat, ImageReader};
use tracing::debug;

use crate::aiimage_types::image::AllowedImageFormat;
use crate::core::error::ImageValidationError;

/// Longest edge, in pixels, of an image written to draft storage.
pub const DEFAULT_MAX_EDGE: u32 = 500;

/// Largest buffer accepted as an image.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_edge: u32,
    pub max_bytes: usize,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_MAX_EDGE,
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// Header facts about a buffer that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: AllowedImageFormat,
    pub width: u32,
    pub height: u32,
}

fn allowed_format(format: ImageFormat) -> Result<AllowedImageFormat, ImageValidationError> {
    match format {
        ImageFormat::Png => Ok(AllowedImageFormat::Png),
        ImageFormat::Jpeg => Ok(AllowedImageFormat::Jpeg),
        ImageFormat::WebP => Ok(AllowedImageFormat::Webp),
        other => Err(ImageValidationError::DisallowedFormat(format!("{other:?}"))),
    }
}

fn image_format(format: AllowedImageFormat) -> ImageFormat {
    match format {
        AllowedImageFormat::Png => ImageFormat::Png,
        AllowedImageFormat::Jpeg => ImageFormat::Jpeg,
        AllowedImageFormat::Webp => ImageFormat::WebP,
    }
}

/// Check that `bytes` really is a PNG, JPEG or WEBP image with sane dimensions.
///
/// Only the header is read; this mirrors "get image size from string" checks
/// rather than a full decode.
pub fn validate_image_content(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<ImageInfo, ImageValidationError> {
    if bytes.is_empty() {
        return Err(ImageValidationError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(ImageValidationError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageValidationError::Undecodable(e.to_string()))?;
    let format = reader.format().ok_or(ImageValidationError::Unrecognized)?;
    let format = allowed_format(format)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ImageValidationError::Undecodable(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(ImageValidationError::Undecodable(
            "image has zero width or height".into(),
        ));
    }
    Ok(ImageInfo {
        format,
        width,
        height,
    })
}

/// Decode an inline base64 image. Accepts an optional `data:` URI prefix.
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, ImageValidationError> {
    let trimmed = data.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };
    if payload.is_empty() {
        return Err(ImageValidationError::Empty);
    }
    B64.decode(payload.as_bytes())
        .or_else(|_| B64_NO_PAD.decode(payload.as_bytes()))
        .map_err(|_| ImageValidationError::InvalidBase64)
}

/// Shrink an image so its longest edge is at most `max_edge`, keeping the
/// aspect ratio and the original format. Smaller images are returned as is.
///
/// Any decode or encode failure hands back the original bytes.
pub fn make_image_smaller(bytes: Vec<u8>, info: &ImageInfo, max_edge: u32) -> Vec<u8> {
    if info.width <= max_edge && info.height <= max_edge {
        return bytes;
    }
    let format = image_format(info.format);
    let decoded = match image::load_from_memory_with_format(&bytes, format) {
        Ok(img) => img,
        Err(err) => {
            debug!(target: "aiimage::image", error = %err, "resize skipped: decode failed");
            return bytes;
        }
    };
    let resized = decoded.resize(max_edge, max_edge, FilterType::CatmullRom);
    let mut out = Vec::new();
    if let Err(err) = resized.write_to(&mut Cursor::new(&mut out), format) {
        debug!(target: "aiimage::image", error = %err, "resize skipped: encode failed");
        return bytes;
    }
    let (width, height) = resized.dimensions();
    debug!(
        target: "aiimage::image",
        from = %format!("{}x{}", info.width, info.height),
        to = %format!("{width}x{height}"),
        "image downsized"
    );
    out
}

/// Validate then downsize. Every bytes-producing path goes through here.
pub fn normalize_image(
    bytes: Vec<u8>,
    limits: &ImageLimits,
) -> Result<Vec<u8>, ImageValidationError> {
    let info = validate_image_content(&bytes, limits.max_bytes)?;
    Ok(make_image_smaller(bytes, &info, limits.max_edge))
}
