//! Relay response envelope.
//!
//! `{"returnCode": "0", "returnMessage": "[{\"url\": …}]"}`: the message is a
//! JSON document encoded as a string. Some relay versions send the array
//! directly, which is accepted too.

use serde::Deserialize;
use serde_json::Value;

use crate::aiimage_types::image::RelayImage;
use crate::core::error::ImageGenError;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "returnCode", default)]
    return_code: Option<Value>,
    #[serde(rename = "returnMessage", default)]
    return_message: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RelayItem {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl RelayItem {
    fn into_image(self) -> Option<RelayImage> {
        match (self.url, self.b64_json) {
            (Some(url), _) if !url.is_empty() => Some(RelayImage::Url { url }),
            (_, Some(data)) if !data.is_empty() => Some(RelayImage::Base64 { data }),
            _ => None,
        }
    }
}

fn code_string(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn message_string(message: Option<&Value>) -> String {
    match message {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Parse a relay response body into the images it carries, in order.
///
/// Items with neither `url` nor `b64_json` are skipped; an envelope that
/// yields no image at all is malformed.
pub fn parse_relay_envelope(text: &str) -> Result<Vec<RelayImage>, ImageGenError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| ImageGenError::malformed(format!("envelope is not JSON: {e}")))?;

    let Some(code) = envelope.return_code else {
        return Err(ImageGenError::RelayFailed {
            code: "missing".into(),
            message: message_string(envelope.return_message.as_ref()),
        });
    };
    let success = match &code {
        Value::String(s) => s.trim() == "0",
        Value::Number(n) => n.as_i64() == Some(0),
        _ => false,
    };
    if !success {
        return Err(ImageGenError::RelayFailed {
            code: code_string(&code),
            message: message_string(envelope.return_message.as_ref()),
        });
    }

    let payload = match envelope.return_message {
        Some(Value::String(encoded)) => serde_json::from_str::<Value>(&encoded)
            .map_err(|e| ImageGenError::malformed(format!("returnMessage is not JSON: {e}")))?,
        Some(value @ Value::Array(_)) => value,
        Some(other) => {
            return Err(ImageGenError::malformed(format!(
                "unexpected returnMessage type: {}",
                json_type(&other)
            )))
        }
        None => return Err(ImageGenError::malformed("returnMessage missing")),
    };
    let items: Vec<RelayItem> = serde_json::from_value(payload)
        .map_err(|e| ImageGenError::malformed(format!("returnMessage is not a list: {e}")))?;

    let images: Vec<RelayImage> = items.into_iter().filter_map(RelayItem::into_image).collect();
    if images.is_empty() {
        return Err(ImageGenError::malformed("payload carried no image"));
    }
    Ok(images)
}

/// The image the relay path persists: the first one in the envelope.
pub fn first_image(text: &str) -> Result<RelayImage, ImageGenError> {
    parse_relay_envelope(text)?
        .into_iter()
        .next()
        .ok_or_else(|| ImageGenError::malformed("payload carried no image"))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
