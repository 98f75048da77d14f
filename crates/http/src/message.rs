//! Immutable message base shared by requests and responses.
//!
//! Concrete messages hold a [`Parts`] and expose it through the [`Message`]
//! trait; every `with_*` mutator returns a fresh instance and leaves the
//! receiver untouched. The body stream handle is shared between derived
//! instances, not copied.

use mime::Mime;

use crate::body::{self, BodyValue};
use crate::error::{HeaderError, ParseError};
use crate::header::HeaderMap;
use crate::stream::Stream;
use crate::version::Version;

/// Version, headers and body common to every message.
#[derive(Debug, Clone, Default)]
pub struct Parts {
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Stream,
}

/// Shared read surface and copy-on-write mutators of an HTTP message.
pub trait Message: Sized {
    fn parts(&self) -> &Parts;

    /// Rebuilds this message around new parts, keeping everything the
    /// concrete type adds on top.
    fn with_parts(&self, parts: Parts) -> Self;

    fn version(&self) -> Version {
        self.parts().version
    }

    fn with_version(&self, version: Version) -> Self {
        let mut parts = self.parts().clone();
        parts.version = version;
        self.with_parts(parts)
    }

    fn headers(&self) -> &HeaderMap {
        &self.parts().headers
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers().contains(name)
    }

    /// First value of the header, if present.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)
    }

    /// All values of the header, empty when absent.
    fn header_values(&self, name: &str) -> &[String] {
        self.headers().values(name)
    }

    /// Values joined with `", "`, or `None` when absent.
    fn header_line(&self, name: &str) -> Option<String> {
        self.headers().line(name)
    }

    /// Replaces the header with a single value.
    fn with_header(&self, name: &str, value: &str) -> Result<Self, HeaderError> {
        self.with_header_values(name, vec![value.to_string()])
    }

    /// Replaces the header with the given values, adopting the spelling.
    fn with_header_values(&self, name: &str, values: Vec<String>) -> Result<Self, HeaderError> {
        let mut parts = self.parts().clone();
        parts.headers.set(name, values)?;
        Ok(self.with_parts(parts))
    }

    /// Appends a value, keeping existing ones.
    fn with_added_header(&self, name: &str, value: &str) -> Result<Self, HeaderError> {
        let mut parts = self.parts().clone();
        parts.headers.append(name, value)?;
        Ok(self.with_parts(parts))
    }

    fn without_header(&self, name: &str) -> Self {
        let mut parts = self.parts().clone();
        parts.headers.remove(name);
        self.with_parts(parts)
    }

    fn body(&self) -> &Stream {
        &self.parts().body
    }

    fn with_body(&self, body: Stream) -> Self {
        let mut parts = self.parts().clone();
        parts.body = body;
        self.with_parts(parts)
    }

    /// The `Content-Type` header as a parsed media type, when present and
    /// well-formed.
    fn content_type(&self) -> Option<Mime> {
        self.header("content-type").and_then(|v| v.parse().ok())
    }

    /// Reads the body fully and decodes it according to the content type.
    fn parse_body(&self) -> Result<BodyValue, ParseError> {
        let bytes = self.body().contents()?;
        body::parse(self.content_type().as_ref(), &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone)]
    struct Plain {
        parts: Parts,
    }

    impl Plain {
        fn new() -> Self {
            Self { parts: Parts::default() }
        }
    }

    impl Message for Plain {
        fn parts(&self) -> &Parts {
            &self.parts
        }

        fn with_parts(&self, parts: Parts) -> Self {
            Self { parts }
        }
    }

    #[test]
    fn mutators_leave_the_receiver_untouched() {
        let first = Plain::new().with_header("X-A", "1").unwrap();
        let second = first.with_header("X-A", "2").unwrap().with_version(Version::Http2);

        assert_eq!(first.header_line("X-A").unwrap(), "1");
        assert_eq!(first.version(), Version::Http11);
        assert_eq!(second.header_line("x-a").unwrap(), "2");
        assert_eq!(second.version(), Version::Http2);
    }

    #[test]
    fn added_header_accumulates() {
        let message = Plain::new()
            .with_header("Accept", "text/html")
            .unwrap()
            .with_added_header("accept", "application/json")
            .unwrap();

        assert_eq!(message.header_values("Accept"), ["text/html", "application/json"]);
        assert_eq!(message.without_header("accept").header_line("Accept"), None);
    }

    #[test]
    fn with_header_rejects_injection() {
        let err = Plain::new().with_header("X", "value\r\nSet-Cookie: evil").unwrap_err();
        assert!(matches!(err, crate::error::HeaderError::InvalidValue { .. }));
    }

    #[test]
    fn content_type_ignores_parameters() {
        let message = Plain::new()
            .with_header("Content-Type", "application/json; charset=utf-8")
            .unwrap();
        assert_eq!(message.content_type().unwrap().essence_str(), "application/json");
    }

    #[test]
    fn parse_body_dispatches_on_content_type() {
        let message = Plain::new()
            .with_header("Content-Type", "application/json")
            .unwrap()
            .with_body(Stream::from_str(r#"{"ok":true}"#));

        assert_eq!(message.parse_body().unwrap(), BodyValue::Json(json!({"ok": true})));
    }

    #[test]
    fn empty_body_parses_to_absent() {
        assert!(Plain::new().parse_body().unwrap().is_absent());
    }

    #[test]
    fn body_stream_is_shared_not_copied() {
        let message = Plain::new().with_body(Stream::from_str("shared"));
        let derived = message.with_version(Version::Http2);

        message.body().close();
        assert!(derived.parse_body().is_err());
    }
}
