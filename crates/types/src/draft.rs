use serde::{Deserialize, Serialize};
use std::fmt;

pub const DRAFT_COMPONENT: &str = "user";
pub const DRAFT_FILE_AREA: &str = "draft";
pub const DRAFT_ROOT_PATH: &str = "/";

/// Where a draft file lives in host storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FileLocation {
    #[serde(rename = "contextid")]
    pub context_id: i64,
    pub component: String,
    #[serde(rename = "filearea")]
    pub file_area: String,
    #[serde(rename = "itemid")]
    pub item_id: i64,
    #[serde(rename = "filepath")]
    pub file_path: String,
    pub filename: String,
}

impl FileLocation {
    /// Location inside a user's draft area, at the root path.
    pub fn user_draft(user_context_id: i64, item_id: i64, filename: impl Into<String>) -> Self {
        Self {
            context_id: user_context_id,
            component: DRAFT_COMPONENT.into(),
            file_area: DRAFT_FILE_AREA.into(),
            item_id,
            file_path: DRAFT_ROOT_PATH.into(),
            filename: filename.into(),
        }
    }
}

/// A location plus the bytes to be written there.
#[derive(Clone, PartialEq, Eq)]
pub struct DraftFileRecord {
    pub location: FileLocation,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for DraftFileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftFileRecord")
            .field("location", &self.location)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the caller gets back once a draft file is in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftFileResult {
    #[serde(rename = "drafturl")]
    pub draft_url: String,
    #[serde(rename = "draftitemid")]
    pub draft_item_id: i64,
    pub filename: String,
    pub error: bool,
}
