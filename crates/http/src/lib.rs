//! An immutable HTTP message model
//!
//! This crate provides the value-object layer of an HTTP stack: requests,
//! responses and server-side requests as immutable data, with copy-on-write
//! `with_*` mutators, validated header storage and content-type aware body
//! codecs. It deliberately contains no transport: messages are modeled as
//! already parsed from, or about to be written to, a connection owned by
//! someone else.
//!
//! URIs come from the companion `tidy-uri` crate and arrive fully
//! normalized, so message identity and the `Host` header stay consistent.
//!
//! # Example
//!
//! ```
//! use tidy_http::{
//!     BodyValue, Environment, HeaderMap, Message, Response, ServerRequest, StatusCode, Stream,
//! };
//!
//! fn main() -> Result<(), tidy_http::HttpError> {
//!     // state as the transport would hand it over
//!     let env = Environment {
//!         method: "POST".to_string(),
//!         uri: "https://api.example.com/items?page=2".to_string(),
//!         version: "HTTP/1.1".to_string(),
//!         headers: vec![("Content-Type".to_string(), vec!["application/json".to_string()])],
//!         body: Stream::from_str(r#"{"name":"widget"}"#),
//!         ..Environment::default()
//!     };
//!
//!     let request = ServerRequest::from_env(env)?;
//!     assert_eq!(request.query_param("page"), Some("2"));
//!
//!     let name = match request.parsed_body()? {
//!         BodyValue::Json(v) => v["name"].as_str().unwrap_or_default().to_string(),
//!         _ => String::new(),
//!     };
//!
//!     let mut headers = HeaderMap::new();
//!     headers.set("Content-Type", vec!["application/json".to_string()])?;
//!     let response = Response::by_content_type(
//!         StatusCode::CREATED,
//!         &BodyValue::Json(serde_json::json!({ "created": name })),
//!         headers,
//!     )?;
//!     assert_eq!(response.status(), StatusCode::CREATED);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`message`]: the shared [`Message`] trait and [`message::Parts`]
//! - [`request`] / [`response`]: outgoing message types
//! - [`server_request`]: incoming requests built from an [`Environment`]
//! - [`header`]: ordered, case-insensitive header storage
//! - [`body`]: content-type dispatch and the CSV/XML codecs
//! - [`stream`] / [`uploaded_file`]: byte-stream and upload handles
//!
//! # Immutability
//!
//! Every mutator returns a fresh instance; the receiver is never changed.
//! The only shared mutable state is the body stream handle, which derived
//! messages reference rather than copy, and the one-shot moved flag of an
//! uploaded file.
//!
//! # Error Handling
//!
//! Each concern has its own error enum ([`HeaderError`], [`ParseError`],
//! [`EncodeError`], [`StreamError`], [`UploadError`]), aggregated by
//! [`HttpError`]. A `ParseError` from body decoding is a client-input
//! problem; a `StreamError` is an I/O problem. Errors are raised at the
//! point of detection and never retried or swallowed.
//!
//! # Security
//!
//! Header values are validated on every insertion, so CR/LF injection can
//! not pass through the model. The XML codec performs no DTD or external
//! entity processing at all, making XXE impossible by construction.

pub mod body;
pub mod error;
pub mod header;
pub mod message;
pub mod request;
pub mod response;
pub mod server_request;
pub mod stream;
pub mod uploaded_file;
pub mod version;

pub use body::BodyValue;
pub use error::{EncodeError, HeaderError, HttpError, ParseError, StreamError, UploadError};
pub use header::HeaderMap;
pub use message::Message;
pub use request::{Method, Request};
pub use response::{Response, StatusCode};
pub use server_request::{Environment, ServerRequest, UploadedFiles};
pub use stream::Stream;
pub use uploaded_file::UploadedFile;
pub use version::Version;
