//! Crash-safe record output.
//!
//! The target file is never touched until its replacement is complete:
//! bytes go to a temporary file in the target directory, are flushed to
//! disk, read back and checked against their digest, and only then renamed
//! over the target. The directory is synced after the rename, so callers may
//! delete superseded files once a write returns.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::codec::RecordCodec;
use crate::digest::RecordDigest;
use crate::error::{RecordError, RecordResult};
use crate::record::Record;

/// Atomically replace `path` with `bytes`, returning their digest.
pub fn write_verified(path: &Path, bytes: &[u8]) -> RecordResult<RecordDigest> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let expected = RecordDigest::from_bytes(bytes);

    let mut tmp = NamedTempFile::new_in(dir).map_err(RecordError::io(dir))?;
    tmp.write_all(bytes).map_err(RecordError::io(tmp.path()))?;
    tmp.as_file().sync_all().map_err(RecordError::io(tmp.path()))?;

    let mut written = Vec::with_capacity(bytes.len());
    tmp.reopen()
        .and_then(|mut f| f.read_to_end(&mut written))
        .map_err(RecordError::io(tmp.path()))?;
    let actual = RecordDigest::from_bytes(&written);
    if actual != expected {
        return Err(RecordError::VerificationFailed {
            path: tmp.path().to_path_buf(),
            expected,
            actual,
        });
    }

    tmp.persist(path).map_err(|e| RecordError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    sync_dir(dir)?;
    debug!(path = %path.display(), digest = %expected.short_hex(), "record written");
    Ok(expected)
}

/// Flush the directory entry so the rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> RecordResult<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(RecordError::io(dir))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> RecordResult<()> {
    Ok(())
}

/// Encode `record` with `codec` and atomically write it to `path`.
pub fn write_record(path: &Path, record: &Record, codec: &dyn RecordCodec) -> RecordResult<RecordDigest> {
    let bytes = codec.encode(record)?;
    write_verified(path, &bytes)
}
