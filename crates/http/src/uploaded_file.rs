//! One-shot wrapper around an uploaded temporary file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::error::{StreamError, UploadError};
use crate::stream::Stream;

/// Upload completed without error.
pub const UPLOAD_OK: u8 = 0;

struct Inner {
    /// Temporary path written by the transport.
    source: PathBuf,
    client_filename: Option<String>,
    client_media_type: Option<String>,
    size: Option<u64>,
    /// Transport error code; `UPLOAD_OK` means success.
    error: u8,
    moved: AtomicBool,
}

/// Handle to a file received with a request.
///
/// The underlying file can be consumed exactly once, either by
/// [`UploadedFile::move_to`] or by reading the stream before a move; after
/// a successful move every further access fails with
/// [`UploadError::AlreadyMoved`]. Clones share the one-shot state.
#[derive(Clone)]
pub struct UploadedFile {
    inner: Arc<Inner>,
}

impl UploadedFile {
    pub fn new(
        source: impl Into<PathBuf>,
        size: Option<u64>,
        error: u8,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source: source.into(),
                client_filename,
                client_media_type,
                size,
                error,
                moved: AtomicBool::new(false),
            }),
        }
    }

    /// Filename as reported by the client. Untrusted input; never use it as
    /// a filesystem path.
    pub fn client_filename(&self) -> Option<&str> {
        self.inner.client_filename.as_deref()
    }

    /// Media type as reported by the client. Untrusted input.
    pub fn client_media_type(&self) -> Option<&str> {
        self.inner.client_media_type.as_deref()
    }

    pub fn size(&self) -> Option<u64> {
        self.inner.size
    }

    /// Transport error code, `UPLOAD_OK` for a successful upload.
    pub fn error(&self) -> u8 {
        self.inner.error
    }

    pub fn is_ok(&self) -> bool {
        self.inner.error == UPLOAD_OK
    }

    /// Read-only stream over the uploaded bytes.
    pub fn stream(&self) -> Result<Stream, UploadError> {
        self.check_usable()?;
        match Stream::from_file(&self.inner.source) {
            Ok(stream) => Ok(stream),
            Err(StreamError::Io { source }) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(UploadError::MissingSource {
                    path: self.inner.source.display().to_string(),
                })
            }
            Err(StreamError::Io { source }) => Err(UploadError::Io { source }),
            Err(other) => Err(UploadError::Io { source: std::io::Error::other(other) }),
        }
    }

    /// Moves the uploaded file to `target`, creating missing parent
    /// directories. Falls back to copy-and-remove when a rename crosses
    /// filesystems.
    pub fn move_to(&self, target: impl AsRef<Path>) -> Result<(), UploadError> {
        self.check_usable()?;
        let target = target.as_ref();
        if !self.inner.source.exists() {
            return Err(UploadError::MissingSource {
                path: self.inner.source.display().to_string(),
            });
        }
        if self.inner.moved.swap(true, Ordering::SeqCst) {
            return Err(UploadError::AlreadyMoved);
        }

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if fs::rename(&self.inner.source, target).is_err() {
            fs::copy(&self.inner.source, target)?;
            fs::remove_file(&self.inner.source)?;
        }
        info!(
            source = %self.inner.source.display(),
            target = %target.display(),
            "moved uploaded file"
        );
        Ok(())
    }

    fn check_usable(&self) -> Result<(), UploadError> {
        if self.inner.error != UPLOAD_OK {
            return Err(UploadError::UploadFailed { code: self.inner.error });
        }
        if self.inner.moved.load(Ordering::SeqCst) {
            return Err(UploadError::AlreadyMoved);
        }
        Ok(())
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("source", &self.inner.source)
            .field("client_filename", &self.inner.client_filename)
            .field("size", &self.inner.size)
            .field("error", &self.inner.error)
            .field("moved", &self.inner.moved.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn scratch(name: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("upload-test-{}-{n}-{name}", std::process::id()))
    }

    fn seeded(name: &str, contents: &str) -> PathBuf {
        let path = scratch(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn move_to_relocates_the_file() {
        let source = seeded("src", "payload");
        let target = scratch("dst");

        let upload = UploadedFile::new(&source, Some(7), UPLOAD_OK, None, None);
        upload.move_to(&target).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "payload");
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn second_move_fails() {
        let source = seeded("twice", "x");
        let target = scratch("twice-dst");

        let upload = UploadedFile::new(&source, None, UPLOAD_OK, None, None);
        upload.move_to(&target).unwrap();

        let err = upload.move_to(scratch("twice-other")).unwrap_err();
        assert!(matches!(err, UploadError::AlreadyMoved));
        assert!(matches!(upload.stream().unwrap_err(), UploadError::AlreadyMoved));
        fs::remove_file(&target).unwrap();
    }

    #[test]
    fn move_creates_parent_directories() {
        let source = seeded("deep", "x");
        let dir = scratch("deep-dir");
        let target = dir.join("a/b/file.bin");

        let upload = UploadedFile::new(&source, None, UPLOAD_OK, None, None);
        upload.move_to(&target).unwrap();
        assert!(target.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_upload_is_unusable() {
        let upload =
            UploadedFile::new("/nonexistent", None, 3, Some("a.txt".to_string()), None);
        assert!(!upload.is_ok());
        assert!(matches!(
            upload.move_to(scratch("never")).unwrap_err(),
            UploadError::UploadFailed { code: 3 }
        ));
        assert!(matches!(upload.stream().unwrap_err(), UploadError::UploadFailed { code: 3 }));
    }

    #[test]
    fn missing_source_is_reported() {
        let upload = UploadedFile::new("/definitely/not/here", None, UPLOAD_OK, None, None);
        assert!(matches!(
            upload.move_to(scratch("never")).unwrap_err(),
            UploadError::MissingSource { .. }
        ));
    }

    #[test]
    fn stream_reads_the_upload() {
        let source = seeded("read", "stream me");
        let upload = UploadedFile::new(&source, None, UPLOAD_OK, None, None);
        assert_eq!(upload.stream().unwrap().contents().unwrap().as_ref(), b"stream me");
        fs::remove_file(&source).unwrap();
    }

    #[test]
    fn clones_share_the_one_shot_state() {
        let source = seeded("shared", "x");
        let target = scratch("shared-dst");

        let upload = UploadedFile::new(&source, None, UPLOAD_OK, None, None);
        let clone = upload.clone();
        upload.move_to(&target).unwrap();

        assert!(matches!(clone.move_to(scratch("never")).unwrap_err(), UploadError::AlreadyMoved));
        fs::remove_file(&target).unwrap();
    }
}
