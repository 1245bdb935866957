use std::sync::Arc;

use tracing::debug;

use crate::aiimage_types::draft::DraftFileResult;
use crate::aiimage_types::image::RelayImage;
use crate::aiimage_types::request::{CallerContext, GenerationRequest};
use crate::core::error::ImageGenError;
use crate::core::image::{decode_base64_image, normalize_image, ImageLimits};
use crate::core::storage::DraftWriter;
use crate::core::transport::{HttpTransport, TransportConfig};
use crate::relay::config::RelayConfig;
use crate::relay::params::RemoteCallParams;
use crate::relay::response::first_image;
use crate::relay::token::{CloudPoodllTokenSource, TokenSource};

pub struct RelayBackend<T: HttpTransport> {
    config: RelayConfig,
    http: Arc<T>,
    tokens: Arc<dyn TokenSource>,
    transport_cfg: TransportConfig,
    writer: Arc<DraftWriter>,
    limits: ImageLimits,
}

impl<T: HttpTransport + 'static> RelayBackend<T> {
    /// Relay backend that fetches tokens from the relay server itself.
    pub fn new(
        config: RelayConfig,
        http: Arc<T>,
        transport_cfg: TransportConfig,
        writer: Arc<DraftWriter>,
        limits: ImageLimits,
    ) -> Result<Self, ImageGenError> {
        let tokens = CloudPoodllTokenSource::new(&config, http.clone(), transport_cfg.clone())?;
        Ok(Self::with_token_source(
            config,
            http,
            Arc::new(tokens),
            transport_cfg,
            writer,
            limits,
        ))
    }
}

impl<T: HttpTransport> RelayBackend<T> {
    pub fn with_token_source(
        config: RelayConfig,
        http: Arc<T>,
        tokens: Arc<dyn TokenSource>,
        transport_cfg: TransportConfig,
        writer: Arc<DraftWriter>,
        limits: ImageLimits,
    ) -> Self {
        Self {
            config,
            http,
            tokens,
            transport_cfg,
            writer,
            limits,
        }
    }

    pub fn set_token_source(&mut self, tokens: Arc<dyn TokenSource>) {
        self.tokens = tokens;
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        draft_item_id: i64,
        filename: &str,
        caller: &CallerContext,
    ) -> Result<DraftFileResult, ImageGenError> {
        if !self.config.has_credentials() {
            return Err(ImageGenError::config("relay API user and secret are required"));
        }
        let endpoint = self.config.endpoint_url()?;
        let token = self
            .tokens
            .fetch_token(&self.config.api_user, &self.config.api_secret)
            .await?;
        if token.trim().is_empty() {
            return Err(ImageGenError::Token {
                message: "empty token".into(),
                source: None,
            });
        }

        let params = RemoteCallParams::for_request(&self.config, &token, request, caller)?;
        debug!(
            target: "aiimage::relay",
            action = request.action().relay_name(),
            region = %self.config.region,
            "calling relay"
        );
        let headers = vec![("accept".to_string(), "application/json".to_string())];
        let (text, _) = self
            .http
            .post_form(&endpoint, &headers, params.fields(), &self.transport_cfg)
            .await?;

        let image = first_image(&text)?;
        let bytes = self.fetch(&image).await?;
        let bytes = normalize_image(bytes, &self.limits)?;
        self.writer.write(bytes, caller, draft_item_id, filename)
    }

    async fn fetch(&self, image: &RelayImage) -> Result<Vec<u8>, ImageGenError> {
        debug!(target: "aiimage::relay", kind = image.kind(), "resolving relay image");
        match image {
            RelayImage::Url { url } => {
                let (bytes, _) = self.http.get_bytes(url, &[], &self.transport_cfg).await?;
                Ok(bytes.to_vec())
            }
            RelayImage::Base64 { data } => Ok(decode_base64_image(data)?),
        }
    }
}
