//! Byte-stream handle backing message bodies.
//!
//! A [`Stream`] is a thin sequential/random-access wrapper over either an
//! in-memory buffer or an OS file. Handles are shared (messages derived via
//! `with_*` reference the same underlying resource); closing or detaching a
//! handle invalidates it for every holder, and all subsequent operations
//! fail with [`StreamError`].

use std::fmt;
use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::error::StreamError;

enum Inner {
    Buffer { cursor: Cursor<Vec<u8>>, writable: bool },
    File { file: fs::File, writable: bool },
    Closed,
    Detached,
}

/// Shared handle over an in-memory buffer or a file.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<Mutex<Inner>>,
}

impl Stream {
    /// Readable and writable in-memory stream over the given bytes,
    /// positioned at the start.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::wrap(Inner::Buffer { cursor: Cursor::new(bytes.into()), writable: true })
    }

    pub fn from_str(s: &str) -> Self {
        Self::from_bytes(s.as_bytes().to_vec())
    }

    /// Empty writable in-memory stream.
    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// Read-only stream over an existing file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let file = fs::File::open(path)?;
        Ok(Self::wrap(Inner::File { file, writable: false }))
    }

    /// The full contents from the beginning of the stream, leaving the
    /// position at the end.
    pub fn contents(&self) -> Result<Bytes, StreamError> {
        match &mut *self.lock() {
            Inner::Buffer { cursor, .. } => {
                cursor.set_position(cursor.get_ref().len() as u64);
                Ok(Bytes::copy_from_slice(cursor.get_ref()))
            }
            Inner::File { file, .. } => {
                file.seek(SeekFrom::Start(0))?;
                let mut buf = Vec::new();
                file.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
            Inner::Closed => Err(StreamError::Closed),
            Inner::Detached => Err(StreamError::Detached),
        }
    }

    /// Reads up to `n` bytes from the current position.
    pub fn read(&self, n: usize) -> Result<Bytes, StreamError> {
        let mut buf = vec![0u8; n];
        let read = match &mut *self.lock() {
            Inner::Buffer { cursor, .. } => cursor.read(&mut buf)?,
            Inner::File { file, .. } => file.read(&mut buf)?,
            Inner::Closed => return Err(StreamError::Closed),
            Inner::Detached => return Err(StreamError::Detached),
        };
        buf.truncate(read);
        Ok(Bytes::from(buf))
    }

    /// Reads everything from the current position to the end.
    pub fn read_to_end(&self) -> Result<Bytes, StreamError> {
        let mut buf = Vec::new();
        match &mut *self.lock() {
            Inner::Buffer { cursor, .. } => cursor.read_to_end(&mut buf)?,
            Inner::File { file, .. } => file.read_to_end(&mut buf)?,
            Inner::Closed => return Err(StreamError::Closed),
            Inner::Detached => return Err(StreamError::Detached),
        };
        Ok(Bytes::from(buf))
    }

    /// Writes at the current position, returning the number of bytes written.
    pub fn write(&self, data: &[u8]) -> Result<usize, StreamError> {
        match &mut *self.lock() {
            Inner::Buffer { cursor, writable } => {
                if !*writable {
                    return Err(StreamError::NotWritable);
                }
                Ok(cursor.write(data)?)
            }
            Inner::File { file, writable } => {
                if !*writable {
                    return Err(StreamError::NotWritable);
                }
                Ok(file.write(data)?)
            }
            Inner::Closed => Err(StreamError::Closed),
            Inner::Detached => Err(StreamError::Detached),
        }
    }

    pub fn seek(&self, pos: SeekFrom) -> Result<u64, StreamError> {
        match &mut *self.lock() {
            Inner::Buffer { cursor, .. } => Ok(cursor.seek(pos)?),
            Inner::File { file, .. } => Ok(file.seek(pos)?),
            Inner::Closed => Err(StreamError::Closed),
            Inner::Detached => Err(StreamError::Detached),
        }
    }

    pub fn rewind(&self) -> Result<(), StreamError> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Total size in bytes, when known.
    pub fn len(&self) -> Result<u64, StreamError> {
        match &*self.lock() {
            Inner::Buffer { cursor, .. } => Ok(cursor.get_ref().len() as u64),
            Inner::File { file, .. } => Ok(file.metadata()?.len()),
            Inner::Closed => Err(StreamError::Closed),
            Inner::Detached => Err(StreamError::Detached),
        }
    }

    pub fn is_empty(&self) -> Result<bool, StreamError> {
        Ok(self.len()? == 0)
    }

    pub fn is_readable(&self) -> bool {
        matches!(&*self.lock(), Inner::Buffer { .. } | Inner::File { .. })
    }

    pub fn is_writable(&self) -> bool {
        matches!(
            &*self.lock(),
            Inner::Buffer { writable: true, .. } | Inner::File { writable: true, .. }
        )
    }

    pub fn is_seekable(&self) -> bool {
        self.is_readable()
    }

    /// Closes the underlying resource; every later operation fails.
    pub fn close(&self) {
        *self.lock() = Inner::Closed;
    }

    /// Detaches the underlying resource without closing the handle; every
    /// later operation fails.
    pub fn detach(&self) {
        *self.lock() = Inner::Detached;
    }

    fn wrap(inner: Inner) -> Self {
        Self { inner: Arc::new(Mutex::new(inner)) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.lock() {
            Inner::Buffer { cursor, .. } => format!("buffer({} bytes)", cursor.get_ref().len()),
            Inner::File { .. } => "file".to_string(),
            Inner::Closed => "closed".to_string(),
            Inner::Detached => "detached".to_string(),
        };
        f.debug_struct("Stream").field("state", &state).finish()
    }
}
