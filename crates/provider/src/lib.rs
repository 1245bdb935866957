//! Native AI provider path.
//!
//! The host exposes its provider manager through [`AiProviderManager`]: an
//! explicit contract for looking a provider up, checking that an action is
//! enabled for it, invoking the action and recording the outcome. Nothing in
//! here reaches into host internals.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::aiimage_types::draft::DraftFileResult;
use crate::aiimage_types::request::{
    AspectRatio, CallerContext, GenerationRequest, ImageAction, Quality, SourceImage, Style,
};
use crate::aiimage_types::response::ActionResponse;
use crate::core::error::ImageGenError;
use crate::core::image::{normalize_image, ImageLimits};
use crate::core::storage::DraftWriter;

/// A configured provider as the host knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInstance {
    /// Instance id used in configuration.
    pub id: String,
    /// Human readable name, e.g. "OpenAI".
    pub name: String,
    /// Provider plugin implementing the instance, e.g. "aiprovider_openai".
    pub plugin: String,
}

/// Action handed to a provider. Edit actions carry the image to edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiAction {
    pub kind: ImageAction,
    pub context_id: i64,
    pub user_id: i64,
    pub prompt_text: String,
    pub quality: Quality,
    pub aspect_ratio: AspectRatio,
    pub num_images: u32,
    pub style: Style,
    pub source_image: Option<SourceImage>,
}

impl AiAction {
    pub fn from_request(request: &GenerationRequest, caller: &CallerContext) -> Self {
        Self {
            kind: request.action(),
            context_id: caller.system_context_id,
            user_id: caller.user_id,
            prompt_text: request.prompt().to_string(),
            quality: request.quality(),
            aspect_ratio: request.aspect_ratio(),
            num_images: request.num_images(),
            style: request.style(),
            source_image: request.source_image().cloned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderCallError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider call failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait AiProviderManager: Send + Sync {
    /// Resolve a configured provider id. `None` when it does not exist.
    async fn provider_instance(&self, provider_id: &str) -> Option<ProviderInstance>;

    /// Whether `action` is switched on for this provider.
    async fn is_action_enabled(&self, provider: &ProviderInstance, action: ImageAction) -> bool;

    /// Execute the action against the provider.
    async fn call_action(
        &self,
        provider: &ProviderInstance,
        action: &AiAction,
    ) -> Result<ActionResponse, ProviderCallError>;

    /// Record the outcome of an action (usage logs, quotas).
    async fn store_action_result(
        &self,
        _provider: &ProviderInstance,
        _action: &AiAction,
        _response: &ActionResponse,
    ) {
    }
}

pub struct ProviderBackend {
    provider_id: String,
    manager: Arc<dyn AiProviderManager>,
    writer: Arc<DraftWriter>,
    limits: ImageLimits,
}

impl ProviderBackend {
    pub fn new(
        provider_id: impl Into<String>,
        manager: Arc<dyn AiProviderManager>,
        writer: Arc<DraftWriter>,
        limits: ImageLimits,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            manager,
            writer,
            limits,
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Look the provider up and make sure it handles `action`.
    pub async fn resolve(&self, action: ImageAction) -> Result<ProviderInstance, ImageGenError> {
        let Some(instance) = self.manager.provider_instance(&self.provider_id).await else {
            return Err(ImageGenError::no_provider_result(format!(
                "provider '{}' not found",
                self.provider_id
            )));
        };
        if !self.manager.is_action_enabled(&instance, action).await {
            return Err(ImageGenError::no_provider_result(format!(
                "{action} is not enabled for provider '{}'",
                self.provider_id
            )));
        }
        Ok(instance)
    }

    /// Run the request through the provider and store the image it returns.
    ///
    /// Anything that happens before the provider reports success is a
    /// [`ImageGenError::NoProviderResult`]; after that, failures are final.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        draft_item_id: i64,
        filename: &str,
        caller: &CallerContext,
    ) -> Result<DraftFileResult, ImageGenError> {
        let instance = self.resolve(request.action()).await?;
        let action = AiAction::from_request(request, caller);

        debug!(
            target: "aiimage::provider",
            provider = %instance.id,
            plugin = %instance.plugin,
            action = %action.kind,
            "calling provider"
        );
        let response = match self.manager.call_action(&instance, &action).await {
            Ok(response) => response,
            Err(err) => {
                return Err(ImageGenError::no_provider_result(format!(
                    "provider '{}' call failed: {err}",
                    instance.id
                )))
            }
        };
        self.manager
            .store_action_result(&instance, &action, &response)
            .await;

        if !response.get_success() {
            return Err(ImageGenError::no_provider_result(format!(
                "provider '{}' reported error {}: {}",
                instance.id, response.error_code, response.error_message
            )));
        }

        let Some(file) = response.into_draft_file() else {
            return Err(ImageGenError::Provider {
                provider: instance.id,
                message: "response carried no image file".into(),
            });
        };
        let bytes = normalize_image(file.content, &self.limits)?;
        self.writer.write(bytes, caller, draft_item_id, filename)
    }
}

#[cfg(test)]
#[path = "../tests/mock_manager.rs"]
pub(crate) mod mock_manager;

#[cfg(test)]
#[path = "../tests/provider_backend_tests.rs"]
mod provider_backend_tests;
