use crate::core::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};

#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Overall request timeout (optional; if None, the client default applies)
    pub request_timeout: Option<Duration>,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// User-Agent sent with every request
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: Some(format!("aiimage-rs/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// Body payload captured for transport observers.
#[derive(Debug, Clone)]
pub enum TransportBody {
    /// Form field names only; values may hold tokens or image data.
    FormKeys(Vec<String>),
    Text(String),
}

/// Structured event emitted by transport implementations.
#[derive(Debug, Clone)]
pub struct TransportEvent {
    pub started_at: SystemTime,
    pub latency: Option<Duration>,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    pub response_headers: Vec<(String, String)>,
    pub request_body: Option<TransportBody>,
    pub response_size: Option<usize>,
    pub error: Option<String>,
}

/// Observer hook for transport events.
pub trait TransportObserver: Send + Sync {
    fn on_event(&self, event: TransportEvent);
}

static TRANSPORT_OBSERVER: OnceLock<Arc<dyn TransportObserver>> = OnceLock::new();

/// Register a transport observer (one-time).
pub fn set_transport_observer(observer: Arc<dyn TransportObserver>) -> bool {
    TRANSPORT_OBSERVER.set(observer).is_ok()
}

/// Emit a transport event if an observer is registered.
pub fn emit_transport_event(event: TransportEvent) {
    if let Some(observer) = TRANSPORT_OBSERVER.get() {
        observer.on_event(event);
    }
}

/// Strip query strings before a URL ends up in logs or events; the relay and
/// signed download links both carry credentials there.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?…"),
        None => url.to_string(),
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `application/x-www-form-urlencoded` fields and return the raw
    /// response text along with response headers. Non-2xx is an error.
    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        fields: &[(String, String)],
        cfg: &TransportConfig,
    ) -> Result<(String, Vec<(String, String)>), TransportError>;

    /// Perform a GET request and return the response bytes along with headers.
    async fn get_bytes(
        &self,
        _url: &str,
        _headers: &[(String, String)],
        _cfg: &TransportConfig,
    ) -> Result<(Bytes, Vec<(String, String)>), TransportError> {
        Err(TransportError::Other(
            "byte downloads are not supported by this transport".into(),
        ))
    }
}
