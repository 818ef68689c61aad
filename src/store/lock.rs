//! Single-writer lock for the index folder
//!
//! The table, cursor and logs assume exactly one writer. A run takes an
//! exclusive advisory lock on `<index_dir>/.lock` using fd-lock and holds it
//! until the run ends.

use super::{StoreError, StoreResult};
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock file wrapper
pub struct StoreLock {
    path: PathBuf,
    lock: RwLock<File>,
}

impl StoreLock {
    /// Open (creating if needed) the lock file at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StoreError::Lock(format!("Failed to open lock file: {e}")))?;

        Ok(Self {
            path: path.to_path_buf(),
            lock: RwLock::new(file),
        })
    }

    /// Acquire the exclusive lock, blocking until it is available
    pub fn exclusive(&mut self) -> StoreResult<RwLockWriteGuard<'_, File>> {
        self.lock
            .write()
            .map_err(|e| StoreError::Lock(format!("Failed to acquire lock: {e}")))
    }

    /// Acquire the exclusive lock or fail immediately if another run holds it
    pub fn try_exclusive(&mut self) -> StoreResult<RwLockWriteGuard<'_, File>> {
        let path = self.path.display().to_string();
        self.lock.try_write().map_err(|e| {
            StoreError::Lock(format!(
                "{path} is held by another run ({e}); only one writer may update the index folder"
            ))
        })
    }
}

// Lock is released when the guard is dropped
