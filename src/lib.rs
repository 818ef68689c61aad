//! # SGX Derivatives Downloader Library
//!
//! Retrieves the daily historical derivatives files published by SGX and keeps
//! track of which upstream publication index belongs to which trading date.
//!
//! ## Features
//!
//! - **Index Resolution**: Maps an upstream index to the date embedded in the
//!   published filename, telling "empty" indices apart from failed lookups
//! - **Latest Tracking**: Probes forward from the persisted cursor to find the
//!   newest publication
//! - **Backfill**: Recovers the index of an arbitrary past date by searching
//!   outward from a known anchor
//! - **Durable Trail**: Failed downloads and failed resolutions are appended to
//!   plain text logs for a later re-run
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sgx_derivatives_downloader::config::DownloaderConfig;
//! use sgx_derivatives_downloader::downloader::{DownloadExecutor, DownloadJob};
//! use sgx_derivatives_downloader::fetcher::sgx_http::SgxHttpFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DownloaderConfig::default();
//! let fetcher = Arc::new(SgxHttpFetcher::new(&config)?);
//!
//! let executor = DownloadExecutor::new(config, fetcher);
//! let report = executor.execute(DownloadJob::Daily).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Explicit configuration passed to every component
//! - [`fetcher`] - The network collaborator (metadata probes and byte streams)
//! - [`store`] - Atomic file writes, the single-writer lock and append-only logs
//! - [`index`] - Index resolution, the index table, the latest cursor and search
//! - [`downloader`] - Per-date bulk download and job orchestration
//! - [`cli`] - Command line surface

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CLI argument parsing and error types
pub mod cli;

/// Downloader configuration
pub mod config;

/// Per-date downloads and job orchestration
pub mod downloader;

/// Network collaborator
pub mod fetcher;

/// Index resolution and bookkeeping
pub mod index;

/// File persistence primitives
pub mod store;

pub use config::DownloaderConfig;
pub use index::{DateIndexResolver, DateToIndexSearch, IndexTable, LatestIndexTracker};

/// Upstream publication index
pub type Index = u64;

/// Trading date carried by a publication, rendered as `YYYYMMDD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(NaiveDate);

impl TradeDate {
    /// Wrap a calendar date
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year, month and day
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse the ISO `YYYY-MM-DD` form used on the command line
    pub fn parse_iso(input: &str) -> Result<Self, String> {
        NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| format!("Invalid date '{input}': {e} (expected YYYY-MM-DD)"))
    }

    /// Underlying calendar date
    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// Previous calendar day
    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    /// Signed number of days from `other` to `self`
    pub fn days_since(&self, other: TradeDate) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl std::fmt::Display for TradeDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

impl FromStr for TradeDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Invalid trade date: {s} (expected YYYYMMDD)"));
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(Self)
            .map_err(|e| format!("Invalid trade date: {s} ({e})"))
    }
}

impl Serialize for TradeDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of asking the upstream which date an index carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDate {
    /// The index carries a publication for this date
    Date(TradeDate),
    /// The index exists but nothing was published for it
    Empty,
    /// The lookup failed (network error, bad status or malformed headers)
    Unresolved,
}

impl ResolvedDate {
    /// Whether this is a real date rather than a sentinel
    pub fn is_date(&self) -> bool {
        matches!(self, ResolvedDate::Date(_))
    }

    /// The resolved date, if any
    pub fn date(&self) -> Option<TradeDate> {
        match self {
            ResolvedDate::Date(date) => Some(*date),
            ResolvedDate::Empty | ResolvedDate::Unresolved => None,
        }
    }
}

impl std::fmt::Display for ResolvedDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedDate::Date(date) => write!(f, "{date}"),
            ResolvedDate::Empty => write!(f, "empty"),
            ResolvedDate::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Files published for every index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Trade cancellation file, always present; used for resolution
    #[serde(rename = "TC.txt")]
    TradeCancellation,
    /// Tick data structure description
    #[serde(rename = "TickData_structure.dat")]
    TickDataStructure,
    /// Trade cancellation structure description
    #[serde(rename = "TC_structure.dat")]
    TradeCancellationStructure,
    /// Zipped tick data
    #[serde(rename = "WEBPXTICK_DT.zip")]
    TickData,
}

impl DataType {
    /// All data types in download order
    pub fn all() -> Vec<DataType> {
        vec![
            DataType::TradeCancellation,
            DataType::TickDataStructure,
            DataType::TradeCancellationStructure,
            DataType::TickData,
        ]
    }

    /// Path segment used in the download URL
    pub fn remote_name(&self) -> &'static str {
        match self {
            DataType::TradeCancellation => "TC.txt",
            DataType::TickDataStructure => "TickData_structure.dat",
            DataType::TradeCancellationStructure => "TC_structure.dat",
            DataType::TickData => "WEBPXTICK_DT.zip",
        }
    }

    /// Name of the file stored in the per-date folder
    pub fn local_file_name(&self, date: TradeDate) -> String {
        match self {
            DataType::TradeCancellation => format!("TC_{date}.txt"),
            DataType::TickData => format!("WEBPXTICK_DT-{date}.zip"),
            DataType::TickDataStructure | DataType::TradeCancellationStructure => {
                self.remote_name().to_string()
            }
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.remote_name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::all()
            .into_iter()
            .find(|data_type| data_type.remote_name() == s)
            .ok_or_else(|| format!("Invalid data type: {s}"))
    }
}
