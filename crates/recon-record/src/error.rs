use std::path::PathBuf;

use recon_geometry::GeometryError;

use crate::digest::RecordDigest;

/// Errors from record construction, coding, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The input document could not be decoded into a record.
    #[error("decode error: {0}")]
    Decode(String),

    /// The record could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The element stream is well-formed but describes an invalid record.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// I/O error while reading or writing a record file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes read back from a freshly written file differ from what was written.
    #[error("verification failed for {path}: wrote {expected}, read back {actual}")]
    VerificationFailed {
        path: PathBuf,
        expected: RecordDigest,
        actual: RecordDigest,
    },

    /// Geometry failure while deriving contour data.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

impl RecordError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> RecordError {
        let path = path.into();
        move |source| RecordError::Io { path, source }
    }

    /// Returns `true` for failures at the codec boundary (unreadable or malformed input).
    pub fn is_codec_failure(&self) -> bool {
        matches!(
            self,
            RecordError::Decode(_) | RecordError::InvalidRecord(_) | RecordError::Io { .. }
        )
    }
}

/// Result alias for record operations.
pub type RecordResult<T> = Result<T, RecordError>;
