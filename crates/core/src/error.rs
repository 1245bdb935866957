use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::aiimage_types::request::RequestError;

/// Coarse bucket an error falls into; logged as a structured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Transport,
    Content,
    Persistence,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Provider => "provider",
            ErrorCategory::Transport => "transport",
            ErrorCategory::Content => "content",
            ErrorCategory::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ImageGenError {
    #[error("configuration error: {message}")]
    Config { message: String },
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    /// The native provider produced nothing usable; the relay should be tried.
    #[error("no provider result: {reason}")]
    NoProviderResult { reason: String },
    #[error("provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },
    #[error("token request failed: {message}")]
    Token {
        message: String,
        #[source]
        source: Option<Box<TransportError>>,
    },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("relay returned code {code}: {message}")]
    RelayFailed { code: String, message: String },
    #[error("malformed relay response: {message}")]
    MalformedRelayResponse { message: String },
    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageValidationError),
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl ImageGenError {
    pub fn config(message: impl Into<String>) -> Self {
        ImageGenError::Config {
            message: message.into(),
        }
    }

    pub fn no_provider_result(reason: impl Into<String>) -> Self {
        ImageGenError::NoProviderResult {
            reason: reason.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        ImageGenError::MalformedRelayResponse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ImageGenError::Config { .. } | ImageGenError::InvalidRequest(_) => {
                ErrorCategory::Configuration
            }
            ImageGenError::NoProviderResult { .. } | ImageGenError::Provider { .. } => {
                ErrorCategory::Provider
            }
            ImageGenError::Token { .. }
            | ImageGenError::Transport(_)
            | ImageGenError::RelayFailed { .. }
            | ImageGenError::MalformedRelayResponse { .. } => ErrorCategory::Transport,
            ImageGenError::InvalidImage(_) => ErrorCategory::Content,
            ImageGenError::Persistence(_) => ErrorCategory::Persistence,
        }
    }

    /// True when the orchestrator should move on to the relay.
    pub fn is_fallback(&self) -> bool {
        matches!(self, ImageGenError::NoProviderResult { .. })
    }

    /// Format error details for logs. Never includes upstream bodies verbatim.
    pub fn format_details(&self) -> String {
        match self {
            ImageGenError::Token {
                message,
                source: Some(src),
            } => format!("token request failed: {message} ({})", src.sanitized_message()),
            ImageGenError::Transport(te) => format!("transport error: {}", te.sanitized_message()),
            other => other.to_string(),
        }
    }
}

/// Rejection reasons for bytes that are supposed to be an image.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageValidationError {
    #[error("image data is empty")]
    Empty,
    #[error("image data is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("not a recognised image")]
    Unrecognized,
    #[error("image format {0} is not allowed")]
    DisallowedFormat(String),
    #[error("image could not be decoded: {0}")]
    Undecodable(String),
    #[error("invalid base64 image data")]
    InvalidBase64,
}

/// Failures reported by a draft file store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file already exists at {path}")]
    AlreadyExists { path: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http status {status}: {sanitized}")]
    HttpStatus {
        status: u16,
        /// upstream body (should be treated as sensitive; only log sanitized)
        body: String,
        /// Sanitized message for display
        sanitized: String,
        /// Upstream response headers (lowercased keys where possible)
        headers: Vec<(String, String)>,
    },
    #[error("network: {0}")]
    Network(String),
    #[error("connect timeout after {0:?}")]
    ConnectTimeout(Duration),
    #[error("body read error: {0}")]
    BodyRead(String),
    #[error("other: {0}")]
    Other(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
    pub fn sanitized_message(&self) -> String {
        match self {
            TransportError::HttpStatus { status, .. } => http_status_fallback_message(*status),
            _ => self.to_string(),
        }
    }
}

pub fn http_status_fallback_message(status: u16) -> String {
    format!("http status {status}")
}

pub fn build_http_status_transport_error(
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
) -> TransportError {
    TransportError::HttpStatus {
        sanitized: display_body_for_error(&body),
        status,
        body,
        headers,
    }
}

pub fn display_body_for_error(body: &str) -> String {
    let trimmed = body.trim();
    let looks_like_json = trimmed.starts_with('{') || trimmed.starts_with('[');
    if looks_like_json {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v) => v.to_string(), // minified JSON
            Err(_) => format!("{} bytes", body.len()),
        }
    } else {
        format!("{} bytes", body.len())
    }
}
