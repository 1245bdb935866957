use serde::{Deserialize, Serialize};
use std::fmt;

/// One image as delivered by the relay, before any bytes are fetched or decoded.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayImage {
    /// Remote location the bytes must be downloaded from.
    Url { url: String },
    /// Inline base64 payload (`b64_json` on the wire).
    Base64 { data: String },
}

impl RelayImage {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayImage::Url { .. } => "url",
            RelayImage::Base64 { .. } => "b64_json",
        }
    }
}

impl fmt::Debug for RelayImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayImage::Url { url } => f.debug_struct("Url").field("url", url).finish(),
            RelayImage::Base64 { data } => f
                .debug_struct("Base64")
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// Image formats accepted into draft storage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AllowedImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl AllowedImageFormat {
    pub fn media_type(&self) -> &'static str {
        match self {
            AllowedImageFormat::Png => "image/png",
            AllowedImageFormat::Jpeg => "image/jpeg",
            AllowedImageFormat::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AllowedImageFormat::Png => "png",
            AllowedImageFormat::Jpeg => "jpg",
            AllowedImageFormat::Webp => "webp",
        }
    }
}
