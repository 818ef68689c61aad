//! Index to date resolution
//!
//! The date of an index is read from the filename the upstream announces in
//! `Content-Disposition` for the always-present `TC.txt` file. Every call goes
//! to the network; nothing is memoized here.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::DownloaderConfig;
use crate::fetcher::filename::extract_date;
use crate::fetcher::Fetcher;
use crate::store::RecoveryLog;
use crate::{DataType, Index, ResolvedDate};

/// Resolves indices to dates through a [`Fetcher`]
#[derive(Clone)]
pub struct DateIndexResolver {
    fetcher: Arc<dyn Fetcher>,
    error_log: RecoveryLog,
}

impl DateIndexResolver {
    /// Data type probed for every resolution
    pub const PROBE_TYPE: DataType = DataType::TradeCancellation;

    /// Create a resolver logging failures to the configured failed-index log
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &DownloaderConfig) -> Self {
        Self {
            fetcher,
            error_log: RecoveryLog::failed_indices(config.index_error_log_path()),
        }
    }

    /// Log of indices whose resolution failed
    pub fn error_log(&self) -> &RecoveryLog {
        &self.error_log
    }

    /// Ask the upstream which date `index` carries
    ///
    /// - a filename with an embedded date yields [`ResolvedDate::Date`]
    /// - a response without one yields [`ResolvedDate::Empty`]
    /// - a failed request yields [`ResolvedDate::Unresolved`] and records the
    ///   index in the failed-index log once
    pub async fn resolve(&self, index: Index) -> ResolvedDate {
        match self.fetcher.fetch_metadata(index, Self::PROBE_TYPE).await {
            Ok(metadata) => {
                let date = metadata.filename().ok().and_then(extract_date);
                match date {
                    Some(date) => {
                        info!(index, %date, "Date {} coordinates index {}", date, index);
                        ResolvedDate::Date(date)
                    }
                    None => {
                        info!(index, "Index {} is empty", index);
                        ResolvedDate::Empty
                    }
                }
            }
            Err(e) => {
                warn!(index, error = %e, "Index {} failed to resolve", index);
                self.record_failure(index);
                ResolvedDate::Unresolved
            }
        }
    }

    fn record_failure(&self, index: Index) {
        if let Err(e) = self.error_log.append_unique(&index.to_string()) {
            error!(
                index,
                path = %self.error_log.path().display(),
                error = %e,
                "Failed to record unresolved index"
            );
        }
    }
}
