//! Content-type dispatch between raw body bytes and structured values.
//!
//! A body is always one of the closed set of shapes in [`BodyValue`];
//! consumers pattern-match instead of sniffing. Decoding and encoding both
//! dispatch on the media type's essence (the part before any `;` parameter),
//! so `application/json; charset=utf-8` selects the JSON codec.

pub mod csv;
pub mod xml;

use mime::Mime;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{EncodeError, ParseError};

/// Structured body value, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyValue {
    /// No body, or a body whose fields arrive through a collaborator
    /// (multipart form data).
    Absent,
    /// Opaque text: unrecognized or missing content type.
    Text(String),
    /// `application/x-www-form-urlencoded` pairs in wire order.
    Form(Vec<(String, String)>),
    Json(JsonValue),
    /// `text/csv` rows.
    Rows(Vec<Vec<String>>),
    /// `text/xml`, `application/xml` or `text/html` tree.
    Document(xml::Document),
}

impl BodyValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, BodyValue::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            BodyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            BodyValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

/// Media types with a dedicated codec; everything else is opaque text.
const FORM: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";
const JSON: &str = "application/json";
const CSV: &str = "text/csv";
const XMLS: [&str; 3] = ["text/xml", "application/xml", "text/html"];

/// Decodes body bytes according to the declared content type. An empty body
/// is [`BodyValue::Absent`] regardless of the type. Text-shaped bodies must
/// be valid UTF-8; bytes are never silently replaced.
pub fn parse(content_type: Option<&Mime>, bytes: &[u8]) -> Result<BodyValue, ParseError> {
    if bytes.is_empty() {
        return Ok(BodyValue::Absent);
    }
    let essence = content_type.map(Mime::essence_str);
    debug!(content_type = essence, len = bytes.len(), "parsing body");

    match essence {
        Some(FORM) => {
            let pairs: Vec<(String, String)> =
                serde_urlencoded::from_bytes(bytes).map_err(ParseError::form)?;
            Ok(BodyValue::Form(pairs))
        }
        // fields are parsed by the environment, not from the raw bytes
        Some(MULTIPART) => Ok(BodyValue::Absent),
        Some(JSON) => {
            let value = serde_json::from_slice(bytes).map_err(ParseError::json)?;
            Ok(BodyValue::Json(value))
        }
        Some(CSV) => {
            let text = std::str::from_utf8(bytes).map_err(|_| ParseError::NotUtf8)?;
            Ok(BodyValue::Rows(csv::parse(text)?))
        }
        Some(t) if XMLS.contains(&t) => {
            let text = std::str::from_utf8(bytes).map_err(|_| ParseError::NotUtf8)?;
            Ok(BodyValue::Document(xml::parse(text)?))
        }
        _ => {
            let text = std::str::from_utf8(bytes).map_err(|_| ParseError::NotUtf8)?;
            Ok(BodyValue::Text(text.to_string()))
        }
    }
}

/// Encodes a value according to the declared content type. The value's shape
/// must match the codec; a mismatch fails with
/// [`EncodeError::UnsupportedShape`]. [`BodyValue::Absent`] always encodes
/// to an empty body.
pub fn encode(content_type: Option<&Mime>, value: &BodyValue) -> Result<Vec<u8>, EncodeError> {
    if value.is_absent() {
        return Ok(Vec::new());
    }
    let essence = content_type.map(Mime::essence_str);
    debug!(content_type = essence, "encoding body");

    match essence {
        Some(FORM) => match value {
            BodyValue::Form(pairs) => serde_urlencoded::to_string(pairs)
                .map(String::into_bytes)
                .map_err(|e| EncodeError::Form { reason: e.to_string() }),
            _ => Err(EncodeError::unsupported_shape(FORM, "key/value pairs")),
        },
        Some(JSON) => match value {
            BodyValue::Json(v) => {
                serde_json::to_vec(v).map_err(|e| EncodeError::Json { reason: e.to_string() })
            }
            _ => Err(EncodeError::unsupported_shape(JSON, "a json value")),
        },
        Some(CSV) => match value {
            BodyValue::Rows(rows) => csv::write(rows).map(String::into_bytes),
            _ => Err(EncodeError::unsupported_shape(CSV, "a list of rows")),
        },
        Some(t) if XMLS.contains(&t) => match value {
            BodyValue::Document(doc) => Ok(doc.to_string().into_bytes()),
            _ => Err(EncodeError::unsupported_shape(t, "a document tree")),
        },
        other => match value {
            BodyValue::Text(s) => Ok(s.clone().into_bytes()),
            _ => Err(EncodeError::unsupported_shape(
                other.unwrap_or("text/plain"),
                "string-like input",
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mime(s: &str) -> Mime {
        s.parse().unwrap()
    }

    #[test]
    fn empty_body_is_absent() {
        let value = parse(Some(&mime("application/json")), b"").unwrap();
        assert!(value.is_absent());
    }

    #[test]
    fn json_round_trip() {
        let ct = mime("application/json; charset=utf-8");
        let value = parse(Some(&ct), br#"{"a":[1,2]}"#).unwrap();
        assert_eq!(value, BodyValue::Json(json!({"a": [1, 2]})));

        let bytes = encode(Some(&ct), &value).unwrap();
        assert_eq!(bytes, br#"{"a":[1,2]}"#);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse(Some(&mime("application/json")), b"{oops").unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
    }

    #[test]
    fn form_body_preserves_wire_order() {
        let value = parse(Some(&mime("application/x-www-form-urlencoded")), b"b=2&a=1").unwrap();
        assert_eq!(
            value,
            BodyValue::Form(vec![("b".into(), "2".into()), ("a".into(), "1".into())])
        );
    }

    #[test]
    fn csv_body_parses_rows() {
        let value = parse(Some(&mime("text/csv")), b"a,b\n1,2\n").unwrap();
        assert_eq!(value, BodyValue::Rows(vec![
            vec!["a".into(), "b".into()],
            vec!["1".into(), "2".into()],
        ]));
    }

    #[test]
    fn xml_and_html_share_the_document_codec() {
        for ct in ["text/xml", "application/xml", "text/html"] {
            let value = parse(Some(&mime(ct)), b"<r><i>x</i></r>").unwrap();
            match value {
                BodyValue::Document(doc) => assert_eq!(doc.root().text(), "x"),
                other => panic!("unexpected value: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_or_missing_type_is_opaque_text() {
        let value = parse(Some(&mime("application/octet-stream")), b"raw").unwrap();
        assert_eq!(value, BodyValue::Text("raw".into()));

        let value = parse(None, b"plain").unwrap();
        assert_eq!(value, BodyValue::Text("plain".into()));
    }

    #[test]
    fn non_utf8_bytes_are_rejected_not_replaced() {
        let err = parse(None, b"\xff\xfe raw").unwrap_err();
        assert!(matches!(err, ParseError::NotUtf8));

        let err = parse(Some(&mime("application/octet-stream")), b"\x80").unwrap_err();
        assert!(matches!(err, ParseError::NotUtf8));
    }

    #[test]
    fn multipart_defers_to_the_environment() {
        let value = parse(Some(&mime("multipart/form-data; boundary=x")), b"--x--").unwrap();
        assert!(value.is_absent());
    }

    #[test]
    fn encode_rejects_shape_mismatch() {
        let err = encode(Some(&mime("text/csv")), &BodyValue::Text("x".into())).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedShape { .. }));

        let err = encode(Some(&mime("application/json")), &BodyValue::Rows(vec![])).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedShape { .. }));

        let err = encode(None, &BodyValue::Json(json!(1))).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedShape { .. }));
    }

    #[test]
    fn absent_encodes_to_empty() {
        let bytes = encode(Some(&mime("application/json")), &BodyValue::Absent).unwrap();
        assert!(bytes.is_empty());
    }
}
