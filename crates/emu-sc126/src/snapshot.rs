//! RAM snapshot persistence.
//!
//! The snapshot is the raw 512 KiB RAM image, no header. A file of any
//! other size is ignored on load — the board then starts with zeroed
//! RAM, which the firmware treats as a cold boot.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use zilog_z180::RAM_SIZE;

/// Exact snapshot file size.
pub const SNAPSHOT_SIZE: usize = RAM_SIZE;

/// Errors from writing a snapshot. Loads never error — a missing or
/// malformed file just means no restore.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot write failed: {0}")]
    Io(#[from] io::Error),
}

/// Load a snapshot, returning `None` for a missing or wrong-size file.
#[must_use]
pub fn load(path: &Path) -> Option<Vec<u8>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %err, "snapshot unreadable");
            }
            return None;
        }
    };
    if data.len() != SNAPSHOT_SIZE {
        tracing::warn!(
            path = %path.display(),
            len = data.len(),
            expected = SNAPSHOT_SIZE,
            "snapshot has wrong size, ignoring"
        );
        return None;
    }
    Some(data)
}

/// Write a snapshot. The caller passes an already-consistent copy of
/// RAM; the file handle is acquired and released within this call.
pub fn save(path: &Path, ram: &[u8]) -> Result<(), SnapshotError> {
    debug_assert_eq!(ram.len(), SNAPSHOT_SIZE);
    fs::write(path, ram)?;
    tracing::debug!(path = %path.display(), "snapshot written");
    Ok(())
}
