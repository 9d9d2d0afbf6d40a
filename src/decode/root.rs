//! Root validation
//!
//! Every response body goes through [`checked_root`] before any
//! resource-specific field is looked at.

use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Parse a response body and surface server-reported failures.
///
/// The server wraps every payload in an envelope with a `stat` field. A
/// `"fail"` status carries an `err` object with a message and a numeric code.
pub fn checked_root(body: &str) -> Result<JsonValue> {
    if body.trim().is_empty() {
        return Err(Error::EmptyResponse);
    }

    let root: JsonValue =
        serde_json::from_str(body).map_err(|e| Error::malformed(e.to_string(), body))?;

    if !root.is_object() {
        return Err(Error::malformed("expected a JSON object", body));
    }

    if root.get("stat").and_then(JsonValue::as_str) == Some("fail") {
        let err = root.get("err");
        let message = err
            .and_then(|e| e.get("msg"))
            .and_then(JsonValue::as_str)
            .unwrap_or("The server reported a failure without a message");
        let code = err.and_then(|e| e.get("code")).and_then(JsonValue::as_i64);
        return Err(Error::server_reported(code, message));
    }

    Ok(root)
}
