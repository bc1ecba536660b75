//! Request body decoding for webhook deliveries.
//!
//! Platforms post either JSON or `application/x-www-form-urlencoded`
//! bodies. Decoding never fails: JSON is tried first, then form fields,
//! and an undecodable body becomes an empty object. Numbers keep their
//! source text, so values outside the `f64` range still decode as JSON.

use serde_json::{Map, Value};

/// Decodes a raw body into an untyped JSON value.
#[must_use]
pub fn decode_payload(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(json_err) => {
            tracing::debug!(error = %json_err, "body is not json, trying form decoding");
            match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
                Ok(pairs) => Value::Object(
                    pairs
                        .into_iter()
                        .map(|(key, value)| (key, Value::String(value)))
                        .collect::<Map<String, Value>>(),
                ),
                Err(form_err) => {
                    tracing::debug!(error = %form_err, "body is not form-encoded either");
                    Value::Object(Map::new())
                }
            }
        }
    }
}
