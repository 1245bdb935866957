use std::sync::Arc;

use tracing::{debug, warn};

use crate::aiimage_types::draft::DraftFileResult;
use crate::aiimage_types::request::{CallerContext, GenerationRequest, ImageAction};
use crate::core::error::ImageGenError;
use crate::core::storage::{DraftFileStore, DraftWriter};
use crate::core::transport::{HttpTransport, TransportConfig};
use crate::imagegen::backend::Backend;
use crate::imagegen::config::ImageGenConfig;
use crate::provider::{AiProviderManager, ProviderBackend};
use crate::relay::{RelayBackend, TokenSource};
use crate::reqwest_transport::ReqwestTransport;

/// Generates or edits an image and leaves it in the caller's draft area.
///
/// The backend chain is fixed at construction: the configured native
/// provider (when one is selected and a manager is supplied) followed by the
/// relay. A provider that reports no result hands over to the relay; any
/// other failure ends the operation.
pub struct ImageGen<T: HttpTransport = ReqwestTransport> {
    config: ImageGenConfig,
    backends: Vec<Backend<T>>,
}

impl<T: HttpTransport + 'static> ImageGen<T> {
    pub fn new(
        config: ImageGenConfig,
        manager: Option<Arc<dyn AiProviderManager>>,
        store: Arc<dyn DraftFileStore>,
        http: Arc<T>,
        transport_cfg: TransportConfig,
    ) -> Result<Self, ImageGenError> {
        let limits = config.limits();
        let writer = Arc::new(DraftWriter::new(store, limits));

        let mut backends = Vec::with_capacity(2);
        match (config.api_provider.provider_id(), manager) {
            (Some(id), Some(manager)) => backends.push(Backend::Provider(ProviderBackend::new(
                id,
                manager,
                writer.clone(),
                limits,
            ))),
            (Some(id), None) => {
                debug!(
                    target: "aiimage::imagegen",
                    provider = id,
                    "no provider manager supplied; relay only"
                );
            }
            (None, _) => {}
        }
        backends.push(Backend::Relay(RelayBackend::new(
            config.relay.clone(),
            http,
            transport_cfg,
            writer,
            limits,
        )?));

        Ok(Self { config, backends })
    }

    /// Replace the relay's token source, e.g. with one that caches.
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        for backend in &mut self.backends {
            if let Backend::Relay(relay) = backend {
                relay.set_token_source(tokens.clone());
            }
        }
        self
    }
}

impl ImageGen<ReqwestTransport> {
    /// Orchestrator over the default reqwest transport.
    pub fn create_simple(
        config: ImageGenConfig,
        manager: Option<Arc<dyn AiProviderManager>>,
        store: Arc<dyn DraftFileStore>,
    ) -> Result<Self, ImageGenError> {
        let cfg = TransportConfig::default();
        let http = Arc::new(ReqwestTransport::new(&cfg));
        Self::new(config, manager, store, http, cfg)
    }
}

impl<T: HttpTransport> ImageGen<T> {
    pub fn config(&self) -> &ImageGenConfig {
        &self.config
    }

    /// Backends in the order they are tried.
    pub fn backends(&self) -> &[Backend<T>] {
        &self.backends
    }

    /// Whether an edit request can be served. With the relay selected it
    /// always can; otherwise the provider must exist and have editing on.
    pub async fn can_edit_image(&self) -> bool {
        if self.config.api_provider.is_relay() {
            return true;
        }
        for backend in &self.backends {
            if let Backend::Provider(provider) = backend {
                return provider.resolve(ImageAction::EditImage).await.is_ok();
            }
        }
        false
    }

    pub async fn try_generate_image(
        &self,
        request: &GenerationRequest,
        draft_item_id: i64,
        filename: &str,
        caller: &CallerContext,
    ) -> Result<DraftFileResult, ImageGenError> {
        if request.action() != ImageAction::GenerateImage {
            return Err(ImageGenError::config(
                "generate_image received a source image; use edit_image",
            ));
        }
        self.run(request, draft_item_id, filename, caller).await
    }

    pub async fn try_edit_image(
        &self,
        request: &GenerationRequest,
        draft_item_id: i64,
        filename: &str,
        caller: &CallerContext,
    ) -> Result<DraftFileResult, ImageGenError> {
        if request.action() != ImageAction::EditImage {
            return Err(ImageGenError::config("edit_image requires a source image"));
        }
        self.run(request, draft_item_id, filename, caller).await
    }

    /// [`ImageGen::try_generate_image`], with failures logged and reported
    /// as `None`.
    pub async fn generate_image(
        &self,
        request: &GenerationRequest,
        draft_item_id: i64,
        filename: &str,
        caller: &CallerContext,
    ) -> Option<DraftFileResult> {
        let result = self
            .try_generate_image(request, draft_item_id, filename, caller)
            .await;
        collapse(ImageAction::GenerateImage, result)
    }

    pub async fn edit_image(
        &self,
        request: &GenerationRequest,
        draft_item_id: i64,
        filename: &str,
        caller: &CallerContext,
    ) -> Option<DraftFileResult> {
        let result = self
            .try_edit_image(request, draft_item_id, filename, caller)
            .await;
        collapse(ImageAction::EditImage, result)
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        draft_item_id: i64,
        filename: &str,
        caller: &CallerContext,
    ) -> Result<DraftFileResult, ImageGenError> {
        let mut last_err = None;
        for backend in &self.backends {
            debug!(
                target: "aiimage::imagegen",
                backend = backend.name(),
                action = %request.action(),
                "trying backend"
            );
            match backend.generate(request, draft_item_id, filename, caller).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_fallback() => {
                    debug!(
                        target: "aiimage::imagegen",
                        backend = backend.name(),
                        reason = %err,
                        "backend produced no result; falling back"
                    );
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| ImageGenError::config("no image backend configured")))
    }
}

fn collapse(
    action: ImageAction,
    result: Result<DraftFileResult, ImageGenError>,
) -> Option<DraftFileResult> {
    match result {
        Ok(file) => Some(file),
        Err(err) => {
            warn!(
                target: "aiimage::imagegen",
                action = %action,
                category = %err.category(),
                error = %err.format_details(),
                "image request failed"
            );
            None
        }
    }
}
