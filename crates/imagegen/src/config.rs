use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::core::image::{ImageLimits, DEFAULT_MAX_EDGE, DEFAULT_MAX_IMAGE_BYTES};
use crate::relay::RelayConfig;

/// Stored value meaning "skip native providers and go straight to the relay".
pub const RELAY_SENTINEL: &str = "-1";

pub const ENV_API_USER: &str = "AIIMAGE_API_USER";
pub const ENV_API_SECRET: &str = "AIIMAGE_API_SECRET";
pub const ENV_REGION: &str = "AIIMAGE_REGION";
pub const ENV_SERVER: &str = "AIIMAGE_SERVER";
pub const ENV_PROVIDER: &str = "AIIMAGE_PROVIDER";

/// Which backend the orchestrator tries first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProviderSelection {
    /// Relay only.
    #[default]
    Relay,
    /// A native provider instance id, with the relay as fallback.
    Provider(String),
}

impl ProviderSelection {
    /// `-1`, `relay` and the empty string select the relay; anything else is
    /// a provider id.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed == RELAY_SENTINEL
            || trimmed.eq_ignore_ascii_case("relay")
        {
            ProviderSelection::Relay
        } else {
            ProviderSelection::Provider(trimmed.to_string())
        }
    }

    pub fn is_relay(&self) -> bool {
        matches!(self, ProviderSelection::Relay)
    }

    pub fn provider_id(&self) -> Option<&str> {
        match self {
            ProviderSelection::Relay => None,
            ProviderSelection::Provider(id) => Some(id),
        }
    }
}

impl fmt::Display for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSelection::Relay => f.write_str(RELAY_SENTINEL),
            ProviderSelection::Provider(id) => f.write_str(id),
        }
    }
}

impl Serialize for ProviderSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProviderSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => ProviderSelection::parse(&n.to_string()),
            Raw::Str(s) => ProviderSelection::parse(&s),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageGenConfig {
    pub api_provider: ProviderSelection,
    pub relay: RelayConfig,
    /// Longest edge of a stored image, in pixels.
    pub max_edge: u32,
    pub max_image_bytes: usize,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            api_provider: ProviderSelection::Relay,
            relay: RelayConfig::default(),
            max_edge: DEFAULT_MAX_EDGE,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl ImageGenConfig {
    /// Defaults overlaid with `AIIMAGE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ImageGenConfig::from_env`] with a custom variable source.
    /// Blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();
        if let Some(v) = get(ENV_API_USER) {
            cfg.relay.api_user = v.trim().to_string();
        }
        if let Some(v) = get(ENV_API_SECRET) {
            cfg.relay.api_secret = v.trim().to_string();
        }
        if let Some(v) = get(ENV_REGION) {
            cfg.relay.region = v.trim().to_string();
        }
        if let Some(v) = get(ENV_SERVER) {
            cfg.relay.server = v.trim().to_string();
        }
        if let Some(v) = get(ENV_PROVIDER) {
            cfg.api_provider = ProviderSelection::parse(&v);
        }
        cfg
    }

    pub fn limits(&self) -> ImageLimits {
        ImageLimits {
            max_edge: self.max_edge,
            max_bytes: self.max_image_bytes,
        }
    }
}
