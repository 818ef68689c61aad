//! Per-date downloads and job orchestration
//!
//! # Overview
//!
//! 1. **Job Creation**: [`job::DownloadJob`] is either the daily fetch of the
//!    latest publication or a recovery over an inclusive date range
//! 2. **Execution**: [`executor::DownloadExecutor`] resolves the index for each
//!    date and hands it to [`files::DateDownloader`]
//! 3. **Progress**: [`progress::ByteProgress`] reports streamed bytes per file
//! 4. **Reporting**: every run produces a [`job::RunReport`]
//!
//! # Error Handling
//!
//! A failed file never aborts a run: it is logged, the date is appended to the
//! recovery log, and the next file is attempted. Only persistence failures of
//! the index folder and invalid jobs surface as [`DownloadError`].

pub mod executor;
pub mod files;
pub mod job;
pub mod progress;

pub use executor::DownloadExecutor;
pub use files::{DateDownloader, DateOutcome};
pub use job::{DownloadJob, JobKind, RunReport};
pub use progress::ByteProgress;

use crate::fetcher::FetcherError;
use crate::index::IndexError;
use crate::store::StoreError;
use crate::TradeDate;

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Fetcher error
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Persistence error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Index bookkeeping error
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Body shorter or longer than announced
    #[error("incomplete download: expected {expected} bytes, received {received}")]
    Incomplete {
        /// Announced length
        expected: u64,
        /// Bytes received
        received: u64,
    },

    /// Recovery range with begin after end
    #[error("invalid range: begin {begin} is after end {end}")]
    InvalidRange {
        /// First date of the range
        begin: TradeDate,
        /// Last date of the range
        end: TradeDate,
    },
}
