use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{PayloadError, Result};

/// Decodes a base64 JSON header value, such as `X-Registry-Auth` style
/// headers returned by the service.
///
/// A missing header is an empty map. A present header that fails to decode
/// is always an error.
pub fn decode_header(value: Option<&str>) -> Result<Map<String, Value>> {
    let value = match value {
        None => return Ok(Map::new()),
        Some(value) => value,
    };
    let raw = STANDARD.decode(value.trim())?;
    let text = String::from_utf8(raw)?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PayloadError::MalformedPayload(format!("expected an object, got '{}'", other))),
        Err(e) => Err(PayloadError::MalformedPayload(e.to_string())),
    }
}

pub fn encode_header(payload: &Map<String, Value>) -> Result<String> {
    let json = serde_json::to_string(payload).map_err(PayloadError::Serialization)?;
    Ok(STANDARD.encode(json))
}
