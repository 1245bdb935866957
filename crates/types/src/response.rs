use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;

/// File produced by a native provider, already read out of host storage.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedFile {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "mediaType")]
    pub media_type: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl fmt::Debug for GeneratedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedFile")
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Payload of a successful provider action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "draftfile")]
    pub draft_file: Option<GeneratedFile>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "revisedprompt"
    )]
    pub revised_prompt: Option<String>,
    /// Provider-specific fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: JsonMap<String, JsonValue>,
}

/// Generic "action response" a provider returns for generate and edit alike.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, rename = "errorcode")]
    pub error_code: i64,
    #[serde(default, rename = "errormessage")]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "responsedata")]
    pub response_data: Option<ResponseData>,
}

impl ActionResponse {
    pub fn success(data: ResponseData) -> Self {
        Self {
            success: true,
            error_code: 0,
            error_message: String::new(),
            response_data: Some(data),
        }
    }

    pub fn failure(error_code: i64, error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code,
            error_message: error_message.into(),
            response_data: None,
        }
    }

    pub fn get_success(&self) -> bool {
        self.success
    }

    pub fn get_response_data(&self) -> Option<&ResponseData> {
        self.response_data.as_ref()
    }

    /// Consume the response and hand back the generated file, if any.
    pub fn into_draft_file(self) -> Option<GeneratedFile> {
        self.response_data.and_then(|d| d.draft_file)
    }
}
