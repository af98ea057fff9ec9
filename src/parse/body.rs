use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{PayloadError, Result};

/// Copy of `body` without the top-level keys whose value is `null`.
///
/// `false`, `0` and `""` are values, not absence, and are kept.
pub fn strip_nulls(body: &Map<String, Value>) -> Map<String, Value> {
    body.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// JSON text for a request body, with null fields omitted. `None` is an
/// empty body.
pub fn prepare_body(body: Option<&Map<String, Value>>) -> Result<String> {
    match body {
        None => Ok(String::new()),
        Some(body) => serde_json::to_string(&strip_nulls(body)).map_err(PayloadError::Serialization),
    }
}

/// Like [`prepare_body`] for any serializable value. Non-object values are
/// serialized unchanged.
pub fn prepare_body_from<T: Serialize + ?Sized>(body: Option<&T>) -> Result<String> {
    let body = match body {
        None => return Ok(String::new()),
        Some(body) => body,
    };
    match serde_json::to_value(body).map_err(PayloadError::Serialization)? {
        Value::Object(map) => prepare_body(Some(&map)),
        other => serde_json::to_string(&other).map_err(PayloadError::Serialization),
    }
}
