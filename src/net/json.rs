//! JSON extraction utilities for catalog API responses.
//!
//! Catalog bodies nest the interesting values a few levels deep
//! (`relationships[].attributes.fileName`, `errors[0].detail`). These helpers
//! walk a dot-separated path, where numeric segments index into arrays.
//!
//! # Examples
//!
//! ```rust
//! use shirabe::net::json;
//! use serde_json::json;
//!
//! let body = json!({
//!     "result": "error",
//!     "errors": [{"status": 400, "title": "Bad Request", "detail": "limit too large"}]
//! });
//!
//! assert_eq!(json::extract_str(&body, "errors.0.title").as_deref(), Some("Bad Request"));
//! assert_eq!(json::extract_str(&body, "errors.0.status").as_deref(), Some("400"));
//! assert!(json::check_api_error(&body).is_err());
//! ```

use serde_json::Value;

use crate::error::{Error, Result};

/// Borrows the value at a dot-separated path.
///
/// Returns `None` if any segment is missing.
pub fn extract_path<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = json;

    for key in path.split('.') {
        current = match current {
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => current.get(key)?,
        };
    }

    Some(current)
}

/// Extracts a scalar at `path` as text.
///
/// Strings are returned as-is and numbers or booleans are formatted. Nulls,
/// empty strings, arrays, and objects yield `None`.
pub fn extract_str(json: &Value, path: &str) -> Option<String> {
    match extract_path(json, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Borrows the array at `path`, or an empty slice if there is none.
pub fn extract_array<'a>(json: &'a Value, path: &str) -> &'a [Value] {
    extract_path(json, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Turns a `"result": "error"` body into [`Error::Api`].
///
/// Only the first reported error is surfaced. Missing fields fall back to
/// placeholder text.
pub fn check_api_error(body: &Value) -> Result<()> {
    if extract_str(body, "result").as_deref() != Some("error") {
        return Ok(());
    }

    let field = |name: &str, fallback: &str| {
        extract_str(body, &format!("errors.0.{}", name)).unwrap_or_else(|| fallback.to_string())
    };

    Err(Error::Api {
        status: field("status", "unknown"),
        title: field("title", "Unknown Error"),
        detail: field("detail", "No details provided"),
        id: field("id", "unknown"),
    })
}
