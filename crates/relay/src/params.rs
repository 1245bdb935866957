use std::fmt;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::aiimage_types::request::{CallerContext, GenerationRequest, ImageAction};
use crate::core::error::ImageGenError;
use crate::core::hash::owner_hash;
use crate::relay::config::{RelayConfig, REST_FORMAT, WS_FUNCTION};

/// Subject sent with generate calls, where there is no source image.
pub const GENERATE_SUBJECT: &str = "1";

/// Form fields for one `local_cpapi_call_ai` call, in wire order.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCallParams {
    fields: Vec<(String, String)>,
}

impl RemoteCallParams {
    fn build(
        config: &RelayConfig,
        token: &str,
        action: ImageAction,
        subject: String,
        prompt: &str,
        caller: &CallerContext,
    ) -> Self {
        let pairs = [
            ("wstoken", token.to_string()),
            ("wsfunction", WS_FUNCTION.to_string()),
            ("moodlewsrestformat", REST_FORMAT.to_string()),
            ("appid", config.app_id.clone()),
            ("action", action.relay_name().to_string()),
            ("subject", subject),
            ("prompt", prompt.to_string()),
            ("language", config.language.clone()),
            ("region", config.region.clone()),
            ("owner", owner_hash(&caller.username)),
        ];
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn generate(
        config: &RelayConfig,
        token: &str,
        prompt: &str,
        caller: &CallerContext,
    ) -> Self {
        Self::build(
            config,
            token,
            ImageAction::GenerateImage,
            GENERATE_SUBJECT.to_string(),
            prompt,
            caller,
        )
    }

    /// Edit call; the source image travels base64 encoded in `subject`.
    pub fn edit(
        config: &RelayConfig,
        token: &str,
        prompt: &str,
        source: &[u8],
        caller: &CallerContext,
    ) -> Result<Self, ImageGenError> {
        if source.is_empty() {
            return Err(ImageGenError::config("edit requires a non-empty source image"));
        }
        Ok(Self::build(
            config,
            token,
            ImageAction::EditImage,
            B64.encode(source),
            prompt,
            caller,
        ))
    }

    pub fn for_request(
        config: &RelayConfig,
        token: &str,
        request: &GenerationRequest,
        caller: &CallerContext,
    ) -> Result<Self, ImageGenError> {
        match request.action() {
            ImageAction::GenerateImage => {
                Ok(Self::generate(config, token, request.prompt(), caller))
            }
            ImageAction::EditImage => {
                let source = request
                    .source_image()
                    .map(|s| s.bytes.as_slice())
                    .unwrap_or_default();
                Self::edit(config, token, request.prompt(), source, caller)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

impl fmt::Debug for RemoteCallParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in &self.fields {
            match k.as_str() {
                "wstoken" => map.entry(k, &"***"),
                "subject" if v.len() > 16 => map.entry(k, &format!("<{} bytes>", v.len())),
                _ => map.entry(k, v),
            };
        }
        map.finish()
    }
}
