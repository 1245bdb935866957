use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde_json::json;

use crate::aiimage_types::draft::FileLocation;
use crate::aiimage_types::request::{GenerationRequest, SourceImage};
use crate::core::error::{ImageGenError, ImageValidationError};
use crate::core::hash::owner_hash;
use crate::core::image::{validate_image_content, ImageLimits, DEFAULT_MAX_IMAGE_BYTES};
use crate::core::storage::{DraftWriter, MemoryDraftStore};
use crate::core::test_fixtures::{caller, jpeg, png};
use crate::core::transport::TransportConfig;
use crate::relay::test_transport::{b64_envelope, url_envelope, ScriptedTransport};
use crate::relay::{RelayBackend, RelayConfig, TokenSource};

fn config() -> RelayConfig {
    RelayConfig {
        api_user: "poodll".into(),
        api_secret: "secret".into(),
        ..Default::default()
    }
}

fn backend(
    config: RelayConfig,
    http: &ScriptedTransport,
    store: Arc<MemoryDraftStore>,
) -> RelayBackend<ScriptedTransport> {
    let writer = Arc::new(DraftWriter::new(store, ImageLimits::default()));
    RelayBackend::new(
        config,
        Arc::new(http.clone()),
        TransportConfig::default(),
        writer,
        ImageLimits::default(),
    )
    .expect("backend")
}

#[tokio::test]
async fn url_payload_is_downloaded_and_stored() {
    let store = Arc::new(MemoryDraftStore::new("https://lms.example"));
    let http = ScriptedTransport::new()
        .relay_reply(url_envelope("https://cdn.example/out.png"))
        .download("https://cdn.example/out.png", png(800, 400, [200, 10, 10]));
    let request = GenerationRequest::generate("a red barn").expect("request");

    let result = backend(config(), &http, store.clone())
        .generate(&request, 8, "barn.png", &caller())
        .await
        .expect("stored");

    assert_eq!(result.filename, "barn.png");
    assert_eq!(
        result.draft_url,
        "https://lms.example/draftfile.php/5/user/draft/8/barn.png"
    );
    assert_eq!(http.token_calls(), 1);
    assert_eq!(http.relay_calls(), 1);
    assert_eq!(http.gets(), vec!["https://cdn.example/out.png".to_string()]);

    let post = http.last_relay_post().expect("relay post");
    assert_eq!(post.url, "https://cloud.poodll.com/webservice/rest/server.php");
    assert_eq!(post.field("wstoken"), Some("tok-123"));
    assert_eq!(post.field("subject"), Some("1"));
    assert_eq!(post.field("region"), Some("useast1"));
    assert_eq!(post.field("owner"), Some(owner_hash("student1").as_str()));

    let token_post = &http.posts()[0];
    assert_eq!(token_post.field("username"), Some("poodll"));
    assert_eq!(token_post.field("password"), Some("secret"));
    assert_eq!(token_post.field("service"), Some("cloud_poodll"));

    let stored = store
        .get_content(&FileLocation::user_draft(5, 8, "barn.png"))
        .expect("content");
    let info = validate_image_content(&stored, DEFAULT_MAX_IMAGE_BYTES).expect("valid");
    assert_eq!((info.width, info.height), (500, 250));
}

#[tokio::test]
async fn base64_and_url_payloads_persist_identically() {
    let bytes = jpeg(64, 48);

    let url_store = Arc::new(MemoryDraftStore::new("https://lms.example"));
    let url_http = ScriptedTransport::new()
        .relay_reply(url_envelope("https://cdn.example/x.jpg"))
        .download("https://cdn.example/x.jpg", bytes.clone());
    let request = GenerationRequest::generate("x").expect("request");
    let from_url = backend(config(), &url_http, url_store.clone())
        .generate(&request, 1, "x.jpg", &caller())
        .await
        .expect("url");

    let b64_store = Arc::new(MemoryDraftStore::new("https://lms.example"));
    let b64_http = ScriptedTransport::new().relay_reply(b64_envelope(&B64.encode(&bytes)));
    let from_b64 = backend(config(), &b64_http, b64_store.clone())
        .generate(&request, 1, "x.jpg", &caller())
        .await
        .expect("b64");

    assert_eq!(from_url, from_b64);
    assert!(b64_http.gets().is_empty());
    let loc = FileLocation::user_draft(5, 1, "x.jpg");
    assert_eq!(url_store.get_content(&loc), b64_store.get_content(&loc));
    assert_eq!(url_store.get_content(&loc), Some(bytes));
}

#[tokio::test]
async fn edit_sends_source_image_as_subject() {
    let store = Arc::new(MemoryDraftStore::new("https://lms.example"));
    let source_bytes = png(16, 16, [0, 0, 255]);
    let http = ScriptedTransport::new().relay_reply(b64_envelope(&B64.encode(png(
        16,
        16,
        [0, 255, 0],
    ))));
    let request = GenerationRequest::edit("make it green", SourceImage::new("in.png", source_bytes.clone()))
        .expect("request");

    backend(config(), &http, store)
        .generate(&request, 3, "green.png", &caller())
        .await
        .expect("stored");

    let post = http.last_relay_post().expect("relay post");
    assert_eq!(post.field("action"), Some("edit_image"));
    assert_eq!(post.field("subject"), Some(B64.encode(&source_bytes).as_str()));
    assert_eq!(post.field("prompt"), Some("make it green"));
}

#[tokio::test]
async fn non_zero_return_code_writes_nothing() {
    let store = Arc::new(MemoryDraftStore::new("https://lms.example"));
    let http = ScriptedTransport::new()
        .relay_reply(json!({"returnCode": "1", "returnMessage": "no credit"}).to_string());
    let request = GenerationRequest::generate("x").expect("request");

    let err = backend(config(), &http, store.clone())
        .generate(&request, 1, "a.png", &caller())
        .await
        .expect_err("relay failure");
    match err {
        ImageGenError::RelayFailed { code, .. } => assert_eq!(code, "1"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.file_count(), 0);
    assert!(http.gets().is_empty());
}

#[tokio::test]
async fn missing_credentials_never_touch_the_network() {
    let store = Arc::new(MemoryDraftStore::new("https://lms.example"));
    let http = ScriptedTransport::new();
    let request = GenerationRequest::generate("x").expect("request");

    let err = backend(RelayConfig::default(), &http, store)
        .generate(&request, 1, "a.png", &caller())
        .await
        .expect_err("config");
    assert!(matches!(err, ImageGenError::Config { .. }), "unexpected error: {err:?}");
    assert!(http.posts().is_empty());
}

#[tokio::test]
async fn token_failures_stop_before_the_relay_call() {
    let request = GenerationRequest::generate("x").expect("request");

    for http in [
        ScriptedTransport::new().token_unreachable(),
        ScriptedTransport::new().token_reply(json!({"error": "Invalid login"}).to_string()),
        ScriptedTransport::new().token_reply(json!({"token": ""}).to_string()),
        ScriptedTransport::new().token_reply("<html>"),
    ] {
        let store = Arc::new(MemoryDraftStore::new("https://lms.example"));
        let err = backend(config(), &http, store)
            .generate(&request, 1, "a.png", &caller())
            .await
            .expect_err("token failure");
        assert!(matches!(err, ImageGenError::Token { .. }), "unexpected error: {err:?}");
        assert_eq!(http.relay_calls(), 0);
    }
}

#[tokio::test]
async fn download_and_content_failures_are_reported() {
    let request = GenerationRequest::generate("x").expect("request");

    let store = Arc::new(MemoryDraftStore::new("https://lms.example"));
    let http = ScriptedTransport::new().relay_reply(url_envelope("https://cdn.example/gone.png"));
    let err = backend(config(), &http, store.clone())
        .generate(&request, 1, "a.png", &caller())
        .await
        .expect_err("404");
    assert!(matches!(err, ImageGenError::Transport(_)), "unexpected error: {err:?}");

    let http = ScriptedTransport::new().relay_reply(b64_envelope(&B64.encode("plain text")));
    let err = backend(config(), &http, store.clone())
        .generate(&request, 1, "a.png", &caller())
        .await
        .expect_err("not an image");
    match err {
        ImageGenError::InvalidImage(ImageValidationError::Unrecognized) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.file_count(), 0);
}

struct FixedToken(&'static str);

#[async_trait]
impl TokenSource for FixedToken {
    async fn fetch_token(&self, _user: &str, _secret: &str) -> Result<String, ImageGenError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn custom_token_source_is_used() {
    let store = Arc::new(MemoryDraftStore::new("https://lms.example"));
    let http = ScriptedTransport::new()
        .relay_reply(b64_envelope(&B64.encode(png(4, 4, [1, 2, 3]))));
    let writer = Arc::new(DraftWriter::new(store, ImageLimits::default()));
    let relay = RelayBackend::with_token_source(
        config(),
        Arc::new(http.clone()),
        Arc::new(FixedToken("cached-token")),
        TransportConfig::default(),
        writer,
        ImageLimits::default(),
    );
    let request = GenerationRequest::generate("x").expect("request");

    relay
        .generate(&request, 1, "a.png", &caller())
        .await
        .expect("stored");
    assert_eq!(http.token_calls(), 0);
    assert_eq!(
        http.last_relay_post().and_then(|p| p.field("wstoken").map(str::to_string)),
        Some("cached-token".to_string())
    );
}
