use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The two things a caller can ask for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImageAction {
    GenerateImage,
    EditImage,
}

impl ImageAction {
    /// Action name understood by native providers.
    pub fn provider_name(&self) -> &'static str {
        match self {
            ImageAction::GenerateImage => "generate_image",
            ImageAction::EditImage => "edit_image",
        }
    }

    /// Action name understood by the relay's `local_cpapi_call_ai` function.
    pub fn relay_name(&self) -> &'static str {
        match self {
            ImageAction::GenerateImage => "generate_images",
            ImageAction::EditImage => "edit_image",
        }
    }
}

impl fmt::Display for ImageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_name())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    Hd,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::Hd => "hd",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape,
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "square",
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Natural,
    Vivid,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Natural => "natural",
            Style::Vivid => "vivid",
        }
    }
}

/// Image the caller wants edited. Bytes are kept as delivered by the host.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Who is asking. Replaces any lookup of a process-wide "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: i64,
    pub username: String,
    /// Context that owns the caller's draft area.
    pub user_context_id: i64,
    /// Context provider actions are recorded against.
    pub system_context_id: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("image count must be at least 1")]
    ZeroImages,
}

/// A single generate or edit request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    quality: Quality,
    aspect_ratio: AspectRatio,
    num_images: u32,
    style: Style,
    source_image: Option<SourceImage>,
}

impl GenerationRequest {
    pub fn builder(prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder::new(prompt)
    }

    /// Generate request with every option left at its default.
    pub fn generate(prompt: impl Into<String>) -> Result<Self, RequestError> {
        Self::builder(prompt).build()
    }

    /// Edit request with every option left at its default.
    pub fn edit(prompt: impl Into<String>, source: SourceImage) -> Result<Self, RequestError> {
        Self::builder(prompt).source_image(source).build()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn num_images(&self) -> u32 {
        self.num_images
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source_image.as_ref()
    }

    pub fn action(&self) -> ImageAction {
        if self.source_image.is_some() {
            ImageAction::EditImage
        } else {
            ImageAction::GenerateImage
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    prompt: String,
    quality: Quality,
    aspect_ratio: AspectRatio,
    num_images: u32,
    style: Style,
    source_image: Option<SourceImage>,
}

impl GenerationRequestBuilder {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            quality: Quality::default(),
            aspect_ratio: AspectRatio::default(),
            num_images: 1,
            style: Style::default(),
            source_image: None,
        }
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn num_images(mut self, n: u32) -> Self {
        self.num_images = n;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn source_image(mut self, source: SourceImage) -> Self {
        self.source_image = Some(source);
        self
    }

    pub fn build(self) -> Result<GenerationRequest, RequestError> {
        if self.prompt.trim().is_empty() {
            return Err(RequestError::EmptyPrompt);
        }
        if self.num_images == 0 {
            return Err(RequestError::ZeroImages);
        }
        Ok(GenerationRequest {
            prompt: self.prompt,
            quality: self.quality,
            aspect_ratio: self.aspect_ratio,
            num_images: self.num_images,
            style: self.style,
            source_image: self.source_image,
        })
    }
}
