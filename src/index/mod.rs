//! Index resolution and bookkeeping
//!
//! The upstream assigns each publication an opaque, increasing integer index.
//! Nothing maps an index to its date except the filename the upstream
//! announces for it, so every question here is answered by probing.
//!
//! # Components
//!
//! - [`resolver::DateIndexResolver`] - asks the fetcher which date an index carries
//! - [`table::IndexTable`] - persisted date to index mapping
//! - [`latest::LatestIndexTracker`] - advances the latest known (date, index) cursor
//! - [`search::DateToIndexSearch`] - recovers the index of an arbitrary past date
//!
//! # Error Handling
//!
//! Resolution never fails: network problems become [`crate::ResolvedDate::Unresolved`]
//! and are written to the failed-index log. The errors in [`IndexError`] only
//! cover persistence and an exhausted search.

pub mod latest;
pub mod resolver;
pub mod search;
pub mod table;

pub use latest::{Cursor, LatestIndexTracker};
pub use resolver::DateIndexResolver;
pub use search::DateToIndexSearch;
pub use table::IndexTable;

use crate::store::StoreError;
use crate::TradeDate;

/// Index bookkeeping errors
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Persistence error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Search exhausted its window without a match
    #[error("no index found for {0}")]
    NotFound(TradeDate),
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
