pub mod error;
pub mod hash;
pub mod image;
pub mod storage;
pub mod transport;

pub use crate::core::error::{
    ErrorCategory, ImageGenError, ImageValidationError, StoreError, TransportError,
};
pub use crate::core::image::{normalize_image, validate_image_content, ImageInfo, ImageLimits};
pub use crate::core::storage::{DraftFileStore, DraftWriter, MemoryDraftStore, StoredFile};
pub use crate::core::transport::{HttpTransport, TransportConfig};

#[cfg(test)]
#[path = "../tests/fixtures.rs"]
pub(crate) mod test_fixtures;

#[cfg(test)]
#[path = "../tests/image_tests.rs"]
mod image_tests;

#[cfg(test)]
#[path = "../tests/storage_tests.rs"]
mod storage_tests;
