use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::request::HeaderVec;

/// Response produced by a handler or an exception handler.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a `content-type` header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create an error response: `{"error": message, "status": status}`
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(
            status,
            serde_json::json!({ "error": message, "status": status }),
        )
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive)
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}
