//! Downloader configuration
//!
//! Every component receives a [`DownloaderConfig`] at construction. The
//! upstream location, the on-disk layout, the reference anchor and the
//! resolution timeout all live here instead of in module-level globals.

use crate::{DataType, Index, TradeDate};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

/// Base URL of the SGX derivatives historical data service
pub const DEFAULT_BASE_URL: &str = "https://links.sgx.com/1.0.0/derivatives-historical";

/// Root folder for downloaded files (one sub-folder per date)
pub const DEFAULT_DATA_DIR: &str = "files";

/// Folder holding the index table, the cursor and the recovery logs
pub const DEFAULT_INDEX_DIR: &str = "index_tables";

/// Index of the reference publication
pub const ANCHOR_INDEX: Index = 5523;

/// Date of the reference publication
pub const ANCHOR_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2023, 10, 6) {
    Some(date) => date,
    None => panic!("anchor date is not a calendar date"),
};

/// Timeout applied to every resolution request.
/// Resolution only needs response headers, so a short bound keeps a probe
/// loop from stalling on one slow index.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Download progress granularity in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Persisted date to index mapping
pub const INDEX_TABLE_FILE: &str = "index_table.json";

/// Persisted latest cursor
pub const LATEST_INDEX_FILE: &str = "latest_index.txt";

/// Dates whose download failed
pub const RECOVERY_LOG_FILE: &str = "recovery.txt";

/// Indices whose resolution failed
pub const INDEX_ERROR_LOG_FILE: &str = "index_error.txt";

/// Single-writer lock file
pub const LOCK_FILE: &str = ".lock";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Base URL is empty
    #[error("base URL must not be empty")]
    EmptyBaseUrl,

    /// Chunk size is zero
    #[error("chunk size must be at least 1 byte")]
    ZeroChunkSize,

    /// A timeout is zero
    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),

    /// No data types selected
    #[error("at least one data type must be selected")]
    NoDataTypes,
}

/// Known-good (date, index) pair used as a search origin and bootstrap value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Publication date
    pub date: TradeDate,
    /// Publication index
    pub index: Index,
}

impl Anchor {
    /// Create an anchor
    pub fn new(date: TradeDate, index: Index) -> Self {
        Self { date, index }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self {
            date: TradeDate::new(ANCHOR_DATE),
            index: ANCHOR_INDEX,
        }
    }
}

/// Runtime configuration shared by all components
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Base URL; requests go to `<base_url>/<index>/<file>`
    pub base_url: String,
    /// Root folder for downloaded files
    pub data_dir: PathBuf,
    /// Folder for the table, cursor, logs and lock
    pub index_dir: PathBuf,
    /// Reference (date, index) pair
    pub anchor: Anchor,
    /// Timeout for resolution requests
    pub resolve_timeout: Duration,
    /// Optional overall timeout for a single file download
    pub download_timeout: Option<Duration>,
    /// Progress granularity in bytes
    pub chunk_size: usize,
    /// Files fetched for every date
    pub data_types: Vec<DataType>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            anchor: Anchor::default(),
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
            download_timeout: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            data_types: DataType::all(),
        }
    }
}

impl DownloaderConfig {
    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the data folder
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Override the index folder
    pub fn with_index_dir(mut self, index_dir: impl Into<PathBuf>) -> Self {
        self.index_dir = index_dir.into();
        self
    }

    /// Override the anchor
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Override the resolution timeout
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    /// Bound every file download by `timeout`
    pub fn with_download_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Override the progress chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Restrict the downloaded data types
    pub fn with_data_types(mut self, data_types: Vec<DataType>) -> Self {
        self.data_types = data_types;
        self
    }

    /// Check the configuration before any component is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.resolve_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("resolve"));
        }
        if self.download_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroTimeout("download"));
        }
        if self.data_types.is_empty() {
            return Err(ConfigError::NoDataTypes);
        }
        Ok(())
    }

    /// Path of the persisted index table
    pub fn index_table_path(&self) -> PathBuf {
        self.index_dir.join(INDEX_TABLE_FILE)
    }

    /// Path of the persisted latest cursor
    pub fn latest_index_path(&self) -> PathBuf {
        self.index_dir.join(LATEST_INDEX_FILE)
    }

    /// Path of the failed-date log
    pub fn recovery_log_path(&self) -> PathBuf {
        self.index_dir.join(RECOVERY_LOG_FILE)
    }

    /// Path of the failed-index log
    pub fn index_error_log_path(&self) -> PathBuf {
        self.index_dir.join(INDEX_ERROR_LOG_FILE)
    }

    /// Path of the lock file
    pub fn lock_path(&self) -> PathBuf {
        self.index_dir.join(LOCK_FILE)
    }

    /// Folder holding the files for `date`
    pub fn date_dir(&self, date: TradeDate) -> PathBuf {
        self.data_dir.join(date.to_string())
    }

    /// URL of `data_type` published under `index`
    pub fn file_url(&self, index: Index, data_type: DataType) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            index,
            data_type.remote_name()
        )
    }
}
