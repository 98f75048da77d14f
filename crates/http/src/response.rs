//! Outgoing-response representation.

use std::fmt;

use tracing::debug;

use crate::body::{self, BodyValue};
use crate::error::{EncodeError, HttpError};
use crate::header::HeaderMap;
use crate::message::{Message, Parts};
use crate::stream::Stream;

/// Validated status code in `100..=599`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const UNPROCESSABLE_CONTENT: StatusCode = StatusCode(422);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    pub fn new(code: u16) -> Result<Self, EncodeError> {
        if !(100..=599).contains(&code) {
            return Err(EncodeError::InvalidStatus(code));
        }
        Ok(Self(code))
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.0)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(&self) -> bool {
        self.0 >= 500
    }

    /// Canonical reason phrase of
    /// [RFC 9110 Section 15](https://datatracker.ietf.org/doc/html/rfc9110#section-15),
    /// when the code has one.
    pub fn canonical_reason(&self) -> Option<&'static str> {
        let phrase = match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            206 => "Partial Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            412 => "Precondition Failed",
            413 => "Content Too Large",
            415 => "Unsupported Media Type",
            416 => "Range Not Satisfiable",
            418 => "I'm a teapot",
            422 => "Unprocessable Content",
            426 => "Upgrade Required",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            _ => return None,
        };
        Some(phrase)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable response: status, optional reason override and the shared
/// message parts.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    reason: Option<String>,
    parts: Parts,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self { status, reason: None, parts: Parts::default() }
    }

    /// Serializes `data` into a fresh body according to the `Content-Type`
    /// found in `headers` (absent means plain text). The value's shape must
    /// match the codec.
    pub fn by_content_type(
        status: StatusCode,
        data: &BodyValue,
        headers: HeaderMap,
    ) -> Result<Self, HttpError> {
        let content_type =
            headers.get("content-type").and_then(|v| v.parse::<mime::Mime>().ok());
        let bytes = body::encode(content_type.as_ref(), data)?;
        debug!(status = status.as_u16(), len = bytes.len(), "built response body");

        let parts = Parts { headers, body: Stream::from_bytes(bytes), ..Parts::default() };
        Ok(Self { status, reason: None, parts })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Explicit reason override, or the canonical phrase, or `""`.
    pub fn reason_phrase(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => self.status.canonical_reason().unwrap_or(""),
        }
    }

    /// Changes the status and clears any reason override.
    pub fn with_status(&self, status: StatusCode) -> Self {
        let mut next = self.clone();
        next.status = status;
        next.reason = None;
        next
    }

    pub fn with_reason(&self, reason: &str) -> Self {
        let mut next = self.clone();
        next.reason = Some(reason.to_string());
        next
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Message for Response {
    fn parts(&self) -> &Parts {
        &self.parts
    }

    fn with_parts(&self, parts: Parts) -> Self {
        let mut next = self.clone();
        next.parts = parts;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_bounds_are_enforced() {
        assert!(StatusCode::new(100).is_ok());
        assert!(StatusCode::new(599).is_ok());
        assert!(matches!(StatusCode::new(99), Err(EncodeError::InvalidStatus(99))));
        assert!(matches!(StatusCode::new(600), Err(EncodeError::InvalidStatus(600))));
    }

    #[test]
    fn status_classes() {
        assert!(StatusCode::OK.is_success());
        assert!(StatusCode::FOUND.is_redirect());
        assert!(StatusCode::NOT_FOUND.is_client_error());
        assert!(StatusCode::SERVICE_UNAVAILABLE.is_server_error());
    }

    #[test]
    fn reason_falls_back_to_canonical() {
        let response = Response::new(StatusCode::NOT_FOUND);
        assert_eq!(response.reason_phrase(), "Not Found");

        let custom = response.with_reason("Nothing Here");
        assert_eq!(custom.reason_phrase(), "Nothing Here");

        // changing the status drops a stale override
        assert_eq!(custom.with_status(StatusCode::OK).reason_phrase(), "OK");

        let unknown = Response::new(StatusCode::new(599).unwrap());
        assert_eq!(unknown.reason_phrase(), "");
    }

    #[test]
    fn by_content_type_encodes_json() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Type", vec!["application/json".to_string()]).unwrap();

        let response = Response::by_content_type(
            StatusCode::OK,
            &BodyValue::Json(json!({"n": 1})),
            headers,
        )
        .unwrap();

        assert_eq!(response.body().contents().unwrap().as_ref(), br#"{"n":1}"#);
        assert_eq!(response.header_line("Content-Type").unwrap(), "application/json");
        // decoding the fresh body gives back the value
        assert_eq!(response.parse_body().unwrap(), BodyValue::Json(json!({"n": 1})));
    }

    #[test]
    fn by_content_type_encodes_csv_rows() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Type", vec!["text/csv".to_string()]).unwrap();

        let rows = BodyValue::Rows(vec![vec!["a".into(), "b,c".into()]]);
        let response =
            Response::by_content_type(StatusCode::OK, &rows, headers).unwrap();
        assert_eq!(response.body().contents().unwrap().as_ref(), b"a,\"b,c\"\n");
    }

    #[test]
    fn by_content_type_rejects_wrong_shape() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Type", vec!["text/csv".to_string()]).unwrap();

        let err = Response::by_content_type(
            StatusCode::OK,
            &BodyValue::Text("nope".into()),
            headers,
        )
        .unwrap_err();
        assert!(matches!(err, HttpError::Encode { .. }));
    }

    #[test]
    fn default_content_type_requires_text() {
        let response = Response::by_content_type(
            StatusCode::OK,
            &BodyValue::Text("hello".into()),
            HeaderMap::new(),
        )
        .unwrap();
        assert_eq!(response.body().contents().unwrap().as_ref(), b"hello");
    }

    #[test]
    fn mutators_preserve_response_fields() {
        let response = Response::new(StatusCode::CREATED).with_header("X", "1").unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.header_line("X").unwrap(), "1");
    }
}
