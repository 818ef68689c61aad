//! Append-only recovery logs
//!
//! Two plain text logs leave a trail for a later re-run:
//! - `recovery.txt`: dates whose download failed, comma-delimited
//! - `index_error.txt`: indices whose resolution failed, space-delimited
//!
//! Entries are never pruned or reconciled automatically.

use super::{StoreError, StoreResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Delimited append-only log file
#[derive(Debug, Clone)]
pub struct RecoveryLog {
    path: PathBuf,
    delimiter: char,
}

impl RecoveryLog {
    /// Log with an explicit delimiter
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    /// Comma-delimited log of failed dates
    pub fn failed_dates(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ',')
    }

    /// Space-delimited log of failed indices
    pub fn failed_indices(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ' ')
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in append order; a missing file reads as empty
    pub fn entries(&self) -> StoreResult<Vec<String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        Ok(contents
            .split(|c: char| c == self.delimiter || c.is_whitespace())
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Whether `entry` has been logged
    pub fn contains(&self, entry: &str) -> StoreResult<bool> {
        Ok(self.entries()?.iter().any(|logged| logged == entry))
    }

    /// Append `entry` followed by the delimiter
    pub fn append(&self, entry: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        write!(file, "{entry}{}", self.delimiter).map_err(|e| StoreError::io(&self.path, e))?;

        debug!(path = %self.path.display(), entry, "Appended to recovery log");
        Ok(())
    }

    /// Append `entry` unless already present; returns whether it was written
    pub fn append_unique(&self, entry: &str) -> StoreResult<bool> {
        if self.contains(entry)? {
            return Ok(false);
        }
        self.append(entry)?;
        Ok(true)
    }
}
