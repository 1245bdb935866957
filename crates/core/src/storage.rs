//! Draft file persistence.
//!
//! The host owns file storage; [`DraftFileStore`] is the part of it this crate
//! needs. [`DraftWriter`] is the single gate bytes pass through on their way
//! in: validate, hash, reuse an identical blob or create a new file.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::aiimage_types::draft::{DraftFileRecord, DraftFileResult, FileLocation};
use crate::aiimage_types::request::CallerContext;
use crate::core::error::{ImageGenError, StoreError};
use crate::core::hash::content_hash;
use crate::core::image::{validate_image_content, ImageLimits};

/// Metadata for a file that exists in host storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub location: FileLocation,
    pub content_hash: String,
    pub size: usize,
}

pub trait DraftFileStore: Send + Sync {
    /// Create the file described by `record`.
    fn create_file_from_bytes(&self, record: &DraftFileRecord) -> Result<StoredFile, StoreError>;

    /// Look up any stored file whose content has this SHA-1 hex hash.
    fn get_file_by_hash(&self, content_hash: &str) -> Result<Option<StoredFile>, StoreError>;

    /// URL the caller's browser uses to fetch a draft file.
    fn draft_file_url(&self, location: &FileLocation) -> String;
}

pub struct DraftWriter {
    store: Arc<dyn DraftFileStore>,
    limits: ImageLimits,
}

impl DraftWriter {
    pub fn new(store: Arc<dyn DraftFileStore>, limits: ImageLimits) -> Self {
        Self { store, limits }
    }

    /// Persist `bytes` as `filename` in the caller's draft area `draft_item_id`.
    ///
    /// Identical content already in storage is reused and nothing is written;
    /// the requested filename is reported either way.
    pub fn write(
        &self,
        bytes: Vec<u8>,
        caller: &CallerContext,
        draft_item_id: i64,
        filename: &str,
    ) -> Result<DraftFileResult, ImageGenError> {
        validate_image_content(&bytes, self.limits.max_bytes)?;

        let location = FileLocation::user_draft(caller.user_context_id, draft_item_id, filename);
        let hash = content_hash(&bytes);
        match self.store.get_file_by_hash(&hash)? {
            Some(existing) => {
                info!(
                    target: "aiimage::storage",
                    hash = %hash,
                    existing = %existing.location.filename,
                    item_id = draft_item_id,
                    "identical content already stored; reusing"
                );
            }
            None => {
                let record = DraftFileRecord {
                    location: location.clone(),
                    bytes,
                };
                let stored = self.store.create_file_from_bytes(&record)?;
                info!(
                    target: "aiimage::storage",
                    hash = %stored.content_hash,
                    size = stored.size,
                    item_id = draft_item_id,
                    filename = %filename,
                    "draft file created"
                );
            }
        }

        Ok(DraftFileResult {
            draft_url: self.store.draft_file_url(&location),
            draft_item_id: location.item_id,
            filename: filename.to_string(),
            error: false,
        })
    }
}

#[derive(Default)]
struct MemoryState {
    blobs: HashMap<String, Vec<u8>>,
    files: HashMap<FileLocation, String>,
}

/// Process-local [`DraftFileStore`]: content-addressed blobs plus a location
/// index. Useful for tests, demos and hosts without their own file API.
pub struct MemoryDraftStore {
    wwwroot: String,
    state: Mutex<MemoryState>,
}

impl MemoryDraftStore {
    pub fn new(wwwroot: impl Into<String>) -> Self {
        Self {
            wwwroot: wwwroot.into().trim_end_matches('/').to_string(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("draft store lock poisoned".into()))
    }

    pub fn blob_count(&self) -> usize {
        self.lock().map(|s| s.blobs.len()).unwrap_or_default()
    }

    pub fn file_count(&self) -> usize {
        self.lock().map(|s| s.files.len()).unwrap_or_default()
    }

    pub fn get_content(&self, location: &FileLocation) -> Option<Vec<u8>> {
        let state = self.lock().ok()?;
        let hash = state.files.get(location)?;
        state.blobs.get(hash).cloned()
    }
}

impl DraftFileStore for MemoryDraftStore {
    fn create_file_from_bytes(&self, record: &DraftFileRecord) -> Result<StoredFile, StoreError> {
        let DraftFileRecord { location, bytes } = record;
        let mut state = self.lock()?;
        if state.files.contains_key(location) {
            return Err(StoreError::AlreadyExists {
                path: format!("{}{}", location.file_path, location.filename),
            });
        }
        let hash = content_hash(bytes);
        state
            .blobs
            .entry(hash.clone())
            .or_insert_with(|| bytes.clone());
        state.files.insert(location.clone(), hash.clone());
        Ok(StoredFile {
            location: location.clone(),
            content_hash: hash,
            size: bytes.len(),
        })
    }

    fn get_file_by_hash(&self, content_hash: &str) -> Result<Option<StoredFile>, StoreError> {
        let state = self.lock()?;
        let Some(blob) = state.blobs.get(content_hash) else {
            return Ok(None);
        };
        Ok(state
            .files
            .iter()
            .find(|(_, h)| h.as_str() == content_hash)
            .map(|(location, _)| StoredFile {
                location: location.clone(),
                content_hash: content_hash.to_string(),
                size: blob.len(),
            }))
    }

    fn draft_file_url(&self, location: &FileLocation) -> String {
        format!(
            "{}/draftfile.php/{}/{}/{}/{}{}{}",
            self.wwwroot,
            location.context_id,
            location.component,
            location.file_area,
            location.item_id,
            location.file_path,
            urlencoding::encode(&location.filename)
        )
    }
}
