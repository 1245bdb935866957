//! Relay access tokens.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::error::ImageGenError;
use crate::core::transport::{HttpTransport, TransportConfig};
use crate::relay::config::{RelayConfig, TOKEN_SERVICE};

/// Exchanges relay API credentials for a web service token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self, api_user: &str, api_secret: &str)
        -> Result<String, ImageGenError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    validuntil: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

/// Token source backed by the relay's `poodlltoken.php` endpoint. Every call
/// hits the network.
pub struct CloudPoodllTokenSource<T: HttpTransport> {
    token_url: String,
    http: Arc<T>,
    transport_cfg: TransportConfig,
}

impl<T: HttpTransport> CloudPoodllTokenSource<T> {
    pub fn new(
        config: &RelayConfig,
        http: Arc<T>,
        transport_cfg: TransportConfig,
    ) -> Result<Self, ImageGenError> {
        Ok(Self {
            token_url: config.token_url()?,
            http,
            transport_cfg,
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> TokenSource for CloudPoodllTokenSource<T> {
    async fn fetch_token(
        &self,
        api_user: &str,
        api_secret: &str,
    ) -> Result<String, ImageGenError> {
        let fields = vec![
            ("username".to_string(), api_user.to_string()),
            ("password".to_string(), api_secret.to_string()),
            ("service".to_string(), TOKEN_SERVICE.to_string()),
        ];
        let headers = vec![("accept".to_string(), "application/json".to_string())];
        let (text, _) = self
            .http
            .post_form(&self.token_url, &headers, &fields, &self.transport_cfg)
            .await
            .map_err(|err| ImageGenError::Token {
                message: "token endpoint unreachable".into(),
                source: Some(Box::new(err)),
            })?;

        let parsed: TokenResponse =
            serde_json::from_str(&text).map_err(|e| ImageGenError::Token {
                message: format!("token response is not JSON: {e}"),
                source: None,
            })?;
        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            return Err(ImageGenError::Token {
                message: error,
                source: None,
            });
        }
        match parsed.token {
            Some(token) if !token.trim().is_empty() => {
                debug!(
                    target: "aiimage::relay::token",
                    valid_until = ?parsed.validuntil,
                    "relay token issued"
                );
                Ok(token)
            }
            _ => Err(ImageGenError::Token {
                message: "token response carried no token".into(),
                source: None,
            }),
        }
    }
}
