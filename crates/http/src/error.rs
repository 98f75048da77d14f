//! Error types of the message model.
//!
//! Each concern gets its own enum, raised synchronously at the point of
//! detection; nothing is retried or swallowed. [`HttpError`] aggregates them
//! for callers that hold a whole request/response pipeline.

use std::io;

use thiserror::Error;
use tidy_uri::UriError;

/// Top-level error type aggregating every concern of the message model.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("header error: {source}")]
    Header {
        #[from]
        source: HeaderError,
    },

    #[error("body parse error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("body encode error: {source}")]
    Encode {
        #[from]
        source: EncodeError,
    },

    #[error("stream error: {source}")]
    Stream {
        #[from]
        source: StreamError,
    },

    #[error("uploaded file error: {source}")]
    Upload {
        #[from]
        source: UploadError,
    },

    #[error("uri error: {source}")]
    Uri {
        #[from]
        source: UriError,
    },
}

/// Header validation failures: bad token grammar in the name, or a value
/// carrying CR/LF (header-injection defense) or other illegal bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("invalid header name: {name:?}")]
    InvalidName { name: String },

    #[error("invalid header value for {name:?}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl HeaderError {
    pub fn invalid_name<S: ToString>(name: S) -> Self {
        Self::InvalidName { name: name.to_string() }
    }

    pub fn invalid_value<N: ToString, R: ToString>(name: N, reason: R) -> Self {
        Self::InvalidValue { name: name.to_string(), reason: reason.to_string() }
    }
}

/// Body decoding failures for a declared content type, plus the message-line
/// parsing failures of environment construction (method, version, target).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid json body: {reason}")]
    Json { reason: String },

    #[error("invalid csv body at line {line}: {reason}")]
    Csv { line: usize, reason: String },

    #[error("invalid xml body: {reason}")]
    Xml { reason: String },

    #[error("invalid form body: {reason}")]
    Form { reason: String },

    #[error("body is not valid utf-8")]
    NotUtf8,

    #[error("invalid http method: {0:?}")]
    Method(String),

    #[error("invalid http version: {0:?}")]
    Version(String),

    #[error("stream error: {source}")]
    Stream {
        #[from]
        source: StreamError,
    },
}

impl ParseError {
    pub fn json<S: ToString>(reason: S) -> Self {
        Self::Json { reason: reason.to_string() }
    }

    pub fn csv<S: ToString>(line: usize, reason: S) -> Self {
        Self::Csv { line, reason: reason.to_string() }
    }

    pub fn xml<S: ToString>(reason: S) -> Self {
        Self::Xml { reason: reason.to_string() }
    }

    pub fn form<S: ToString>(reason: S) -> Self {
        Self::Form { reason: reason.to_string() }
    }
}

/// Body serialization failures: data of the wrong shape for the declared
/// content type, or an out-of-range status code.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{content_type} body requires {expected}")]
    UnsupportedShape { content_type: String, expected: &'static str },

    #[error("json encoding failed: {reason}")]
    Json { reason: String },

    #[error("form encoding failed: {reason}")]
    Form { reason: String },

    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    #[error("stream error: {source}")]
    Stream {
        #[from]
        source: StreamError,
    },
}

impl EncodeError {
    pub fn unsupported_shape<S: ToString>(content_type: S, expected: &'static str) -> Self {
        Self::UnsupportedShape { content_type: content_type.to_string(), expected }
    }
}

/// Failures of the byte-stream handle: operations on a closed or detached
/// handle, capability mismatches, or OS-level I/O errors.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream is closed")]
    Closed,

    #[error("stream is detached")]
    Detached,

    #[error("stream is not readable")]
    NotReadable,

    #[error("stream is not writable")]
    NotWritable,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Uploaded-file failures: one-shot move violations, a non-OK upload error
/// code, or a failing filesystem operation.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("uploaded file was already moved")]
    AlreadyMoved,

    #[error("upload failed with error code {code}")]
    UploadFailed { code: u8 },

    #[error("upload source does not exist: {path}")]
    MissingSource { path: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}
