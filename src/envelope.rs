//! The uniform JSON response envelope.
//!
//! Every response hitch produces has the shape
//!
//! ```json
//! {"success": true, "result": {"id": 42}}
//! {"success": false, "error": "No Access"}
//! ```
//!
//! with the HTTP status carried on the status line, never in the body.

use std::fmt::Display;

use http::{HeaderValue, StatusCode, header};
use serde::Serialize;
use tracing::error;

use crate::error::{Error, SerializationFault};
use crate::response::{IntoResponse, Response, ResponseWriter};

/// `Content-Type` of every envelope.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// A response envelope. Built per response, written once, discarded.
///
/// By convention `error` is `None` when `success` is true and `result` is
/// `None` when it is false. The constructors keep to that.
#[derive(Debug, Serialize)]
pub struct JsonResult<T = serde_json::Value> {
    pub success: bool,
    #[serde(skip)]
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> JsonResult<T> {
    /// `200`, `success: true`.
    pub fn success(result: T) -> Self {
        Self { success: true, status: StatusCode::OK, error: None, result: Some(result) }
    }

    /// `success: false` with `error`'s message.
    pub fn failure(status: StatusCode, error: impl Display) -> Self {
        Self { success: false, status, error: Some(error.to_string()), result: None }
    }
}

impl<T: Serialize> JsonResult<T> {
    /// Encodes the envelope and commits it with its status and a JSON
    /// content type.
    ///
    /// # Panics
    ///
    /// Panics with a [`SerializationFault`] payload if `T` fails to
    /// serialize. Nothing has been written at that point; the router's panic
    /// handler answers the request with a 500 envelope instead.
    pub fn write(self, mut w: ResponseWriter) {
        let body = self.encode();
        w.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        w.write(self.status, body);
    }

    fn encode(&self) -> Vec<u8> {
        match serde_json::to_vec(self) {
            Ok(mut body) => {
                body.push(b'\n');
                body
            }
            Err(err) => std::panic::panic_any(SerializationFault(err)),
        }
    }
}

impl<T: Serialize> IntoResponse for JsonResult<T> {
    fn into_response(self) -> Response {
        let body = self.encode();
        Response::with_body(self.status, JSON_CONTENT_TYPE, body)
    }
}

// ── Shortcuts ─────────────────────────────────────────────────────────────────

/// `200 {"success":true,"result":…}`
pub fn result_response<T: Serialize>(w: ResponseWriter, result: T) {
    JsonResult::success(result).write(w);
}

/// `500 {"success":false,"error":…}`. Logs `err` first.
pub fn error_response(w: ResponseWriter, err: impl Display) {
    error!("{err}");
    JsonResult::<()>::failure(StatusCode::INTERNAL_SERVER_ERROR, err).write(w);
}

/// `417 {"success":false,"error":…}` for payloads over the size cap.
pub fn size_response(w: ResponseWriter, err: impl Display) {
    JsonResult::<()>::failure(StatusCode::EXPECTATION_FAILED, err).write(w);
}

/// `401 {"success":false,"error":"No Access"}`
pub fn no_access(w: ResponseWriter) {
    JsonResult::<()>::failure(StatusCode::UNAUTHORIZED, Error::Access).write(w);
}
