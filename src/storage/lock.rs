//! Lock-then-rewrite primitives for JSON array files
//!
//! Writers serialize through an advisory lock on a sidecar `.lock` file and
//! replace the data file with an atomic rename, so a reader (or a killed
//! writer) only ever observes a complete array. The lock lives on a separate
//! file because the rename swaps out the data file's inode.

use crate::storage::traits::{JournalError, JournalResult};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exclusive advisory lock, released on drop
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

/// Acquires an exclusive lock on `lock_path`, waiting at most `timeout`
///
/// # Returns
///
/// * `Ok(LockGuard)` - The lock is held until the guard is dropped
/// * `Err(JournalError::LockTimeout)` - Another holder kept the lock too long
/// * `Err(JournalError::Io)` - The lock file could not be opened or locked
pub fn acquire_lock(lock_path: &Path, timeout: Duration) -> JournalResult<LockGuard> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;

    let start = Instant::now();
    loop {
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                return Ok(LockGuard {
                    file,
                    path: lock_path.to_path_buf(),
                })
            }
            Err(e) if is_contended(&e) => {
                let waited = start.elapsed();
                if waited >= timeout {
                    return Err(JournalError::LockTimeout {
                        path: lock_path.to_path_buf(),
                        waited_ms: waited.as_millis() as u64,
                    });
                }
                std::thread::sleep(LOCK_POLL_INTERVAL.min(timeout - waited));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn is_contended(error: &std::io::Error) -> bool {
    error.kind() == ErrorKind::WouldBlock
        || error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Reads a JSON array, treating a missing, empty or corrupt file as empty
pub fn read_json_array<T: DeserializeOwned>(path: &Path) -> JournalResult<Vec<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    match serde_json::from_slice(&bytes) {
        Ok(items) => Ok(items),
        Err(e) => {
            tracing::warn!(
                "Ignoring unreadable contents of {}: {}",
                path.display(),
                e
            );
            Ok(Vec::new())
        }
    }
}

/// Replaces `path` with a pretty-printed JSON array in one atomic rename
pub fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> JournalResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| JournalError::InvalidPath(path.to_path_buf()))?;

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    items.serialize(&mut serializer)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&buffer)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
