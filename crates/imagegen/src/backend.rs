use crate::aiimage_types::draft::DraftFileResult;
use crate::aiimage_types::request::{CallerContext, GenerationRequest};
use crate::core::error::ImageGenError;
use crate::core::transport::HttpTransport;
use crate::provider::ProviderBackend;
use crate::relay::RelayBackend;

/// One link in the fallback chain.
pub enum Backend<T: HttpTransport> {
    Provider(ProviderBackend),
    Relay(RelayBackend<T>),
}

impl<T: HttpTransport> Backend<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Provider(_) => "provider",
            Backend::Relay(_) => "relay",
        }
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        draft_item_id: i64,
        filename: &str,
        caller: &CallerContext,
    ) -> Result<DraftFileResult, ImageGenError> {
        match self {
            Backend::Provider(p) => p.generate(request, draft_item_id, filename, caller).await,
            Backend::Relay(r) => r.generate(request, draft_item_id, filename, caller).await,
        }
    }
}
