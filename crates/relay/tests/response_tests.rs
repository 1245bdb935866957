use serde_json::json;

use crate::aiimage_types::image::RelayImage;
use crate::core::error::ImageGenError;
use crate::relay::response::{first_image, parse_relay_envelope};

#[test]
fn string_encoded_message_with_url() {
    let body = json!({
        "returnCode": "0",
        "returnMessage": "[{\"url\":\"https://cdn.example/a.png\"}]"
    })
    .to_string();
    assert_eq!(
        parse_relay_envelope(&body).expect("parsed"),
        vec![RelayImage::Url {
            url: "https://cdn.example/a.png".into()
        }]
    );
}

#[test]
fn numeric_code_and_decoded_array_are_tolerated() {
    let body = json!({
        "returnCode": 0,
        "returnMessage": [{"b64_json": "aGVsbG8="}, {"url": "https://cdn.example/b.png"}]
    })
    .to_string();
    let images = parse_relay_envelope(&body).expect("parsed");
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].kind(), "b64_json");
}

#[test]
fn url_wins_when_both_are_present() {
    let body = json!({
        "returnCode": "0",
        "returnMessage": json!([{"url": "https://cdn.example/c.png", "b64_json": "aGk="}]).to_string()
    })
    .to_string();
    match first_image(&body).expect("image") {
        RelayImage::Url { url } => assert_eq!(url, "https://cdn.example/c.png"),
        other => panic!("unexpected image: {other:?}"),
    }
}

#[test]
fn non_zero_code_is_relay_failure() {
    let body = json!({"returnCode": "1", "returnMessage": "quota exceeded"}).to_string();
    match parse_relay_envelope(&body) {
        Err(ImageGenError::RelayFailed { code, message }) => {
            assert_eq!(code, "1");
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let body = json!({"returnCode": 500}).to_string();
    match parse_relay_envelope(&body) {
        Err(ImageGenError::RelayFailed { code, .. }) => assert_eq!(code, "500"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn missing_code_is_relay_failure() {
    let body = json!({"returnMessage": "[]"}).to_string();
    match parse_relay_envelope(&body) {
        Err(ImageGenError::RelayFailed { code, .. }) => assert_eq!(code, "missing"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn malformed_payloads() {
    for body in [
        "<html>bad gateway</html>".to_string(),
        json!({"returnCode": "0"}).to_string(),
        json!({"returnCode": "0", "returnMessage": "not json"}).to_string(),
        json!({"returnCode": "0", "returnMessage": "[]"}).to_string(),
        json!({"returnCode": "0", "returnMessage": "[{\"revised_prompt\":\"x\"}]"}).to_string(),
        json!({"returnCode": "0", "returnMessage": {"url": "x"}}).to_string(),
    ] {
        match parse_relay_envelope(&body) {
            Err(ImageGenError::MalformedRelayResponse { .. }) => {}
            other => panic!("unexpected result for {body}: {other:?}"),
        }
    }
}
