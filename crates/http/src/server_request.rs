//! Incoming-request representation built from ambient server state.
//!
//! The transport (or test harness) fills an [`Environment`] with the raw
//! strings it received; [`ServerRequest::from_env`] is the single glue
//! surface turning that into the typed model. Everything downstream of it
//! is immutable, like the rest of the message types.

use serde_json::Value as JsonValue;
use tidy_uri::Uri;
use tracing::debug;

use crate::body::BodyValue;
use crate::error::{HttpError, ParseError};
use crate::message::{Message, Parts};
use crate::request::{Method, Request};
use crate::stream::Stream;
use crate::uploaded_file::UploadedFile;
use crate::version::Version;

/// Nested uploaded-file descriptors, mirroring the field structure of a
/// multipart form (`files[avatar]`, `files[docs][0]`, ...).
#[derive(Debug, Clone)]
pub enum UploadedFiles {
    File(UploadedFile),
    Map(Vec<(String, UploadedFiles)>),
}

impl UploadedFiles {
    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            UploadedFiles::File(f) => Some(f),
            UploadedFiles::Map(_) => None,
        }
    }

    /// Child node of a map by field name.
    pub fn get(&self, name: &str) -> Option<&UploadedFiles> {
        match self {
            UploadedFiles::File(_) => None,
            UploadedFiles::Map(entries) => {
                entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
        }
    }

    /// All files in the tree as `(dotted.path, file)` pairs, depth-first.
    pub fn flatten(&self) -> Vec<(String, &UploadedFile)> {
        let mut out = Vec::new();
        self.collect("", &mut out);
        out
    }

    fn collect<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a UploadedFile)>) {
        match self {
            UploadedFiles::File(f) => out.push((prefix.to_string(), f)),
            UploadedFiles::Map(entries) => {
                for (name, node) in entries {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    node.collect(&path, out);
                }
            }
        }
    }
}

/// Raw per-request state handed over by the transport.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub method: String,
    pub uri: String,
    /// `"HTTP/1.1"` spelling or the short form; empty means HTTP/1.1.
    pub version: String,
    pub headers: Vec<(String, Vec<String>)>,
    pub cookies: Vec<(String, String)>,
    /// Transport-level facts (remote address, server name, ...), opaque to
    /// the model.
    pub server_params: Vec<(String, String)>,
    pub uploads: Option<UploadedFiles>,
    pub body: Stream,
}

/// Immutable incoming request: the base [`Request`] plus server-side
/// context (query, cookies, uploads, attributes, parsed-body override).
#[derive(Debug, Clone)]
pub struct ServerRequest {
    request: Request,
    query: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    server_params: Vec<(String, String)>,
    uploads: Option<UploadedFiles>,
    /// Set by middleware to replace content-type dispatch.
    parsed_body: Option<BodyValue>,
    attributes: Vec<(String, JsonValue)>,
}

impl ServerRequest {
    /// Builds the typed request from raw environment state. The method and
    /// version must parse, the URI must be well-formed, and every header
    /// must pass validation.
    pub fn from_env(env: Environment) -> Result<Self, HttpError> {
        let method: Method = env.method.parse().map_err(HttpError::from)?;
        let version = if env.version.is_empty() {
            Version::default()
        } else {
            env.version.parse().map_err(HttpError::from)?
        };
        let uri = Uri::parse(&env.uri)?;
        debug!(method = %method, uri = %uri, "building server request");

        let mut request = Request::new(method, uri);
        for (name, values) in env.headers {
            request.headers_mut().set(&name, values)?;
        }
        let request = request.with_version(version).with_body(env.body);
        let query = request.uri().query_params().to_vec();

        Ok(Self {
            request,
            query,
            cookies: env.cookies,
            server_params: env.server_params,
            uploads: env.uploads,
            parsed_body: None,
            attributes: Vec::new(),
        })
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// Decoded query pairs in wire order.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn with_query_params(&self, pairs: Vec<(String, String)>) -> Self {
        let mut next = self.clone();
        next.query = pairs;
        next
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn with_cookies(&self, cookies: Vec<(String, String)>) -> Self {
        let mut next = self.clone();
        next.cookies = cookies;
        next
    }

    pub fn server_params(&self) -> &[(String, String)] {
        &self.server_params
    }

    pub fn server_param(&self, name: &str) -> Option<&str> {
        self.server_params.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn uploaded_files(&self) -> Option<&UploadedFiles> {
        self.uploads.as_ref()
    }

    pub fn with_uploaded_files(&self, uploads: Option<UploadedFiles>) -> Self {
        let mut next = self.clone();
        next.uploads = uploads;
        next
    }

    /// The structured body: an explicit override when one was installed,
    /// otherwise content-type dispatch over the body stream.
    pub fn parsed_body(&self) -> Result<BodyValue, ParseError> {
        match &self.parsed_body {
            Some(value) => Ok(value.clone()),
            None => self.request.parse_body(),
        }
    }

    pub fn with_parsed_body(&self, value: Option<BodyValue>) -> Self {
        let mut next = self.clone();
        next.parsed_body = value;
        next
    }

    pub fn attribute(&self, name: &str) -> Option<&JsonValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn attributes(&self) -> &[(String, JsonValue)] {
        &self.attributes
    }

    pub fn with_attribute(&self, name: &str, value: JsonValue) -> Self {
        let mut next = self.clone();
        match next.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => next.attributes.push((name.to_string(), value)),
        }
        next
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.attributes.retain(|(n, _)| n != name);
        next
    }
}

impl Message for ServerRequest {
    fn parts(&self) -> &Parts {
        self.request.parts()
    }

    fn with_parts(&self, parts: Parts) -> Self {
        let mut next = self.clone();
        next.request = self.request.with_parts(parts);
        next
    }
}
