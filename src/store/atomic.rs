//! Atomic whole-file writes
//!
//! Writes land in a temporary file next to the target, are flushed and
//! synced, then renamed over the target so readers never observe a torn file.

use super::{StoreError, StoreResult};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Replace `path` with `contents` atomically, creating parent folders as needed
pub fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir).map_err(|e| StoreError::io(parent_dir, e))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
        .map_err(|e| StoreError::io(parent_dir, format!("Failed to create temp file: {e}")))?;

    temp_file
        .write_all(contents)
        .map_err(|e| StoreError::io(path, format!("Failed to write to temp file: {e}")))?;
    temp_file
        .flush()
        .map_err(|e| StoreError::io(path, format!("Failed to flush temp file: {e}")))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| StoreError::io(path, format!("Failed to sync temp file: {e}")))?;

    temp_file
        .persist(path)
        .map_err(|e| StoreError::io(path, format!("Failed to persist temp file: {e}")))?;

    // Fsync parent directory so the rename itself is durable
    if let Ok(dir) = std::fs::File::open(parent_dir) {
        let _ = dir.sync_all();
    }

    debug!(path = %path.display(), bytes = contents.len(), "File written atomically");
    Ok(())
}
