use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use crate::core::error::{build_http_status_transport_error, TransportError};
use crate::core::transport::{HttpTransport, TransportConfig};

#[derive(Debug, Clone)]
pub(crate) struct RecordedPost {
    pub url: String,
    pub fields: Vec<(String, String)>,
}

impl RecordedPost {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

struct State {
    token_reply: Option<String>,
    relay_reply: Option<String>,
    downloads: HashMap<String, Vec<u8>>,
    posts: Vec<RecordedPost>,
    gets: Vec<String>,
}

/// Canned relay server: answers the token endpoint, the web service endpoint
/// and image downloads, recording every request.
#[derive(Clone)]
pub(crate) struct ScriptedTransport {
    state: Arc<Mutex<State>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                token_reply: Some(json!({"token": "tok-123", "validuntil": 1_900_000_000}).to_string()),
                relay_reply: None,
                downloads: HashMap::new(),
                posts: Vec::new(),
                gets: Vec::new(),
            })),
        }
    }

    pub fn token_reply(self, body: impl Into<String>) -> Self {
        self.state.lock().unwrap().token_reply = Some(body.into());
        self
    }

    pub fn token_unreachable(self) -> Self {
        self.state.lock().unwrap().token_reply = None;
        self
    }

    pub fn relay_reply(self, body: impl Into<String>) -> Self {
        self.state.lock().unwrap().relay_reply = Some(body.into());
        self
    }

    pub fn download(self, url: &str, bytes: Vec<u8>) -> Self {
        self.state
            .lock()
            .unwrap()
            .downloads
            .insert(url.to_string(), bytes);
        self
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn token_calls(&self) -> usize {
        self.posts()
            .iter()
            .filter(|p| p.url.ends_with("/local/cpapi/poodlltoken.php"))
            .count()
    }

    pub fn relay_calls(&self) -> usize {
        self.posts()
            .iter()
            .filter(|p| p.url.ends_with("/webservice/rest/server.php"))
            .count()
    }

    pub fn last_relay_post(&self) -> Option<RecordedPost> {
        self.posts()
            .into_iter()
            .rev()
            .find(|p| p.url.ends_with("/webservice/rest/server.php"))
    }

    pub fn gets(&self) -> Vec<String> {
        self.state.lock().unwrap().gets.clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_form(
        &self,
        url: &str,
        _headers: &[(String, String)],
        fields: &[(String, String)],
        _cfg: &TransportConfig,
    ) -> Result<(String, Vec<(String, String)>), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.posts.push(RecordedPost {
            url: url.to_string(),
            fields: fields.to_vec(),
        });
        let reply = if url.ends_with("/local/cpapi/poodlltoken.php") {
            state.token_reply.clone()
        } else {
            state.relay_reply.clone()
        };
        match reply {
            Some(body) => Ok((body, Vec::new())),
            None => Err(TransportError::Network(format!("connect: {url} refused"))),
        }
    }

    async fn get_bytes(
        &self,
        url: &str,
        _headers: &[(String, String)],
        _cfg: &TransportConfig,
    ) -> Result<(Bytes, Vec<(String, String)>), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.gets.push(url.to_string());
        match state.downloads.get(url) {
            Some(bytes) => Ok((Bytes::from(bytes.clone()), Vec::new())),
            None => Err(build_http_status_transport_error(404, "not found".into(), Vec::new())),
        }
    }
}

pub(crate) fn url_envelope(url: &str) -> String {
    json!({
        "returnCode": "0",
        "returnMessage": json!([{ "url": url }]).to_string(),
    })
    .to_string()
}

pub(crate) fn b64_envelope(data: &str) -> String {
    json!({
        "returnCode": "0",
        "returnMessage": json!([{ "b64_json": data }]).to_string(),
    })
    .to_string()
}
