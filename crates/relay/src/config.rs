use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::core::error::ImageGenError;

pub const DEFAULT_SERVER: &str = "cloud.poodll.com";
pub const DEFAULT_REGION: &str = "useast1";
pub const DEFAULT_APP_ID: &str = "repository_aiimage";
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const WS_FUNCTION: &str = "local_cpapi_call_ai";
pub const REST_FORMAT: &str = "json";
pub const REST_PATH: &str = "/webservice/rest/server.php";
pub const TOKEN_PATH: &str = "/local/cpapi/poodlltoken.php";
pub const TOKEN_SERVICE: &str = "cloud_poodll";

/// Relay connection settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Host name, optionally with scheme. `https://` is assumed when absent.
    pub server: String,
    pub api_user: String,
    pub api_secret: String,
    pub region: String,
    pub app_id: String,
    pub language: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.into(),
            api_user: String::new(),
            api_secret: String::new(),
            region: DEFAULT_REGION.into(),
            app_id: DEFAULT_APP_ID.into(),
            language: DEFAULT_LANGUAGE.into(),
        }
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("server", &self.server)
            .field("api_user", &self.api_user)
            .field("api_secret", &if self.api_secret.is_empty() { "" } else { "***" })
            .field("region", &self.region)
            .field("app_id", &self.app_id)
            .field("language", &self.language)
            .finish()
    }
}

impl RelayConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_user.trim().is_empty() && !self.api_secret.trim().is_empty()
    }

    /// Base server URL, e.g. `https://cloud.poodll.com`.
    pub fn server_url(&self) -> Result<Url, ImageGenError> {
        let raw = self.server.trim();
        let raw = if raw.is_empty() { DEFAULT_SERVER } else { raw };
        let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };
        Url::parse(&with_scheme).map_err(|e| {
            ImageGenError::config(format!("invalid relay server '{}': {e}", self.server))
        })
    }

    fn join(&self, path: &str) -> Result<String, ImageGenError> {
        let base = self.server_url()?;
        Ok(format!(
            "{}{}",
            base.as_str().trim_end_matches('/'),
            path
        ))
    }

    pub fn endpoint_url(&self) -> Result<String, ImageGenError> {
        self.join(REST_PATH)
    }

    pub fn token_url(&self) -> Result<String, ImageGenError> {
        self.join(TOKEN_PATH)
    }
}
