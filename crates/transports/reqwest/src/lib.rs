use crate::core::error::{build_http_status_transport_error, TransportError};
use crate::core::transport::{
    emit_transport_event, redact_url, HttpTransport, TransportBody, TransportConfig,
    TransportEvent,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::error::Error as StdError;
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    fn configure_builder(
        mut builder: reqwest::ClientBuilder,
        cfg: &TransportConfig,
    ) -> reqwest::ClientBuilder {
        builder = builder
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Duration::from_secs(90));
        if let Some(req_timeout) = cfg.request_timeout {
            builder = builder.timeout(req_timeout);
        }
        if let Some(ua) = &cfg.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        builder.connect_timeout(cfg.connect_timeout)
    }

    fn try_new_with_builder(
        cfg: &TransportConfig,
        builder: reqwest::ClientBuilder,
    ) -> Result<Self, TransportError> {
        let builder = Self::configure_builder(builder, cfg);
        let client = builder.build().map_err(|err| {
            TransportError::Other(format!(
                "reqwest client build failed: {}",
                format_reqwest_error_chain(&err)
            ))
        })?;
        Ok(Self { client })
    }

    fn new_with_builder(cfg: &TransportConfig, builder: reqwest::ClientBuilder) -> Self {
        match Self::try_new_with_builder(cfg, builder) {
            Ok(transport) => transport,
            Err(err) => {
                debug!(
                    target: "aiimage::transport::reqwest",
                    error = %err,
                    "falling back to reqwest::Client::new after transport init failure"
                );
                Self {
                    client: Client::new(),
                }
            }
        }
    }

    pub fn try_new(cfg: &TransportConfig) -> Result<Self, TransportError> {
        Self::try_new_with_builder(cfg, Client::builder())
    }

    pub fn new(cfg: &TransportConfig) -> Self {
        Self::new_with_builder(cfg, Client::builder())
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        method: &str,
        url: &str,
        request_body: Option<TransportBody>,
        cfg: &TransportConfig,
    ) -> Result<(reqwest::Response, EventContext), TransportError> {
        let ctx = EventContext {
            started_at: SystemTime::now(),
            start_instant: Instant::now(),
            method: method.to_string(),
            url: redact_url(url),
            request_body,
        };

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                let detail = format_reqwest_error_chain(&e);
                debug!(target: "aiimage::transport::reqwest", url = %ctx.url, %detail, "reqwest send failed");
                ctx.emit(None, Vec::new(), None, Some(detail.clone()));
                return Err(if e.is_connect() {
                    TransportError::Network(format!("connect: {detail}"))
                } else if e.is_timeout() {
                    TransportError::ConnectTimeout(cfg.connect_timeout)
                } else {
                    TransportError::Network(detail)
                });
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let res_headers = header_pairs(resp.headers());
            let body_text = resp.text().await.unwrap_or_default();
            let err =
                build_http_status_transport_error(status.as_u16(), body_text, res_headers.clone());
            ctx.emit(
                Some(status.as_u16()),
                res_headers,
                None,
                Some(err.to_string()),
            );
            return Err(err);
        }
        Ok((resp, ctx))
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

struct EventContext {
    started_at: SystemTime,
    start_instant: Instant,
    method: String,
    url: String,
    request_body: Option<TransportBody>,
}

impl EventContext {
    fn emit(
        &self,
        status: Option<u16>,
        response_headers: Vec<(String, String)>,
        response_size: Option<usize>,
        error: Option<String>,
    ) {
        emit_transport_event(TransportEvent {
            started_at: self.started_at,
            latency: Some(self.start_instant.elapsed()),
            method: self.method.clone(),
            url: self.url.clone(),
            status,
            response_headers,
            request_body: self.request_body.clone(),
            response_size,
            error,
        });
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        fields: &[(String, String)],
        cfg: &TransportConfig,
    ) -> Result<(String, Vec<(String, String)>), TransportError> {
        let mut req = self.client.post(url).form(fields);
        for (k, v) in headers {
            // .form() sets the urlencoded content type
            if !k.eq_ignore_ascii_case("content-type") {
                req = req.header(k, v);
            }
        }
        let keys = fields.iter().map(|(k, _)| k.clone()).collect();
        let (resp, ctx) = self
            .send(req, "POST", url, Some(TransportBody::FormKeys(keys)), cfg)
            .await?;

        let status = resp.status().as_u16();
        let res_headers = header_pairs(resp.headers());
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::BodyRead(e.to_string()))?;
        ctx.emit(Some(status), res_headers.clone(), Some(text.len()), None);
        Ok((text, res_headers))
    }

    async fn get_bytes(
        &self,
        url: &str,
        headers: &[(String, String)],
        cfg: &TransportConfig,
    ) -> Result<(Bytes, Vec<(String, String)>), TransportError> {
        let mut req = self.client.get(url);
        for (k, v) in headers {
            req = req.header(k, v);
        }
        let (resp, ctx) = self.send(req, "GET", url, None, cfg).await?;

        let status = resp.status().as_u16();
        let res_headers = header_pairs(resp.headers());
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::BodyRead(e.to_string()))?;
        ctx.emit(Some(status), res_headers.clone(), Some(bytes.len()), None);
        Ok((bytes, res_headers))
    }
}

fn header_pairs(headers: &http::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn format_reqwest_error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(src) = current {
        out.push_str(": ");
        out.push_str(&src.to_string());
        current = src.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_returns_transport_error_when_client_build_fails() {
        let cfg = TransportConfig {
            user_agent: Some("bad\nagent".into()),
            ..TransportConfig::default()
        };
        match ReqwestTransport::try_new(&cfg) {
            Ok(_) => panic!("invalid user-agent should fail reqwest client build"),
            Err(TransportError::Other(message)) => {
                assert!(
                    message.contains("reqwest client build failed"),
                    "unexpected message: {message}"
                );
            }
            Err(other) => panic!("unexpected transport error variant: {other:?}"),
        }
    }

    #[test]
    fn new_does_not_panic_when_client_build_fails() {
        let cfg = TransportConfig {
            user_agent: Some("bad\nagent".into()),
            ..TransportConfig::default()
        };
        let _transport = ReqwestTransport::new(&cfg);
    }

    #[test]
    fn header_pairs_keeps_names_and_values() {
        let mut h = http::HeaderMap::new();
        h.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        assert_eq!(
            header_pairs(&h),
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }
}
