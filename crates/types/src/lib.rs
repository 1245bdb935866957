//! Data model shared by the orchestrator, the provider contract and the relay.
//!
//! Everything here is request-scoped: built for one user action and dropped
//! once the draft file (or the failure) has been reported.

pub mod draft;
pub mod image;
pub mod request;
pub mod response;

pub use draft::{DraftFileRecord, DraftFileResult, FileLocation};
pub use image::{AllowedImageFormat, RelayImage};
pub use request::{
    AspectRatio, CallerContext, GenerationRequest, GenerationRequestBuilder, ImageAction, Quality,
    RequestError, SourceImage, Style,
};
pub use response::{ActionResponse, GeneratedFile, ResponseData};

#[cfg(test)]
#[path = "../tests/request_tests.rs"]
mod request_tests;
