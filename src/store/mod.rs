//! File persistence primitives
//!
//! Everything the index logic keeps on disk goes through this module:
//! whole-file replacement with atomic renames, the single-writer lock that
//! guards the index folder for the duration of a run, and the append-only
//! recovery logs.

pub mod atomic;
pub mod lock;
pub mod recovery_log;

pub use atomic::write_atomic;
pub use lock::StoreLock;
pub use recovery_log::RecoveryLog;

use std::path::PathBuf;

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error on {path}: {reason}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        reason: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File content could not be parsed
    #[error("corrupt file {path}: {reason}")]
    Corrupt {
        /// File involved
        path: PathBuf,
        /// Parse failure
        reason: String,
    },

    /// Lock error
    #[error("lock error: {0}")]
    Lock(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        StoreError::Io {
            path: path.into(),
            reason: error.to_string(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
