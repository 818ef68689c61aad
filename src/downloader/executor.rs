//! Download execution engine
//!
//! Runs a [`DownloadJob`] end to end while holding the single-writer lock on
//! the index folder. Awaits are strictly sequential: one probe or one file
//! transfer is in flight at any time.

use std::sync::Arc;
use tracing::{info, warn};

use super::files::{DateDownloader, DateOutcome};
use super::job::{DownloadJob, JobKind, RunReport};
use super::DownloadError;
use crate::config::DownloaderConfig;
use crate::fetcher::Fetcher;
use crate::index::{
    DateIndexResolver, DateToIndexSearch, IndexError, IndexTable, LatestIndexTracker,
};
use crate::store::StoreLock;
use crate::{Index, TradeDate};

/// Download executor
pub struct DownloadExecutor {
    config: DownloaderConfig,
    resolver: DateIndexResolver,
    downloader: DateDownloader,
}

impl DownloadExecutor {
    /// Create an executor over `fetcher`
    pub fn new(config: DownloaderConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let resolver = DateIndexResolver::new(Arc::clone(&fetcher), &config);
        let downloader = DateDownloader::new(fetcher, &config);
        Self {
            config,
            resolver,
            downloader,
        }
    }

    /// Enable or disable terminal progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.downloader = self.downloader.with_progress(show_progress);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Validate and run `job`
    ///
    /// Fails fast when another run holds the index folder lock.
    pub async fn execute(&self, job: DownloadJob) -> Result<RunReport, DownloadError> {
        job.validate()?;

        let mut lock = StoreLock::open(&self.config.lock_path())?;
        let _guard = lock.try_exclusive()?;

        info!(job = %job.kind(), "Starting download job");
        let report = match job {
            DownloadJob::Daily => self.run_daily().await?,
            DownloadJob::Recovery { .. } => self.run_recovery(&job.dates()).await?,
        };
        info!(job = %report.job, "{}", report.summary());
        Ok(report)
    }

    async fn run_daily(&self) -> Result<RunReport, DownloadError> {
        let mut report = RunReport::new(JobKind::Daily);

        let tracker = LatestIndexTracker::new(self.resolver.clone(), &self.config);
        let cursor = tracker.get_latest().await?;
        report.latest = Some(cursor);

        if self.downloader.is_downloaded(cursor.date) {
            info!(date = %cursor.date, index = cursor.index, "Latest date {} already downloaded", cursor.date);
            report.dates_skipped += 1;
            return Ok(report);
        }

        let mut table = IndexTable::load(&self.config)?;
        table.add(&self.resolver, cursor.index).await?;

        self.download_date(cursor.date, cursor.index, &mut report).await;
        Ok(report)
    }

    async fn run_recovery(&self, dates: &[TradeDate]) -> Result<RunReport, DownloadError> {
        let mut report = RunReport::new(JobKind::Recovery);

        let mut table = IndexTable::load(&self.config)?;
        let mut search = DateToIndexSearch::new(self.resolver.clone(), &self.config);

        for &date in dates {
            let index = match table.get(date) {
                Some(index) => index,
                None => match search.find_index(date).await {
                    Ok(index) => {
                        table.insert(date, index);
                        table.save()?;
                        info!(%date, index, "Index {} is added", index);
                        index
                    }
                    Err(IndexError::NotFound(_)) => {
                        info!(%date, "No publication found for {}", date);
                        report.dates_not_found += 1;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                },
            };

            self.download_date(date, index, &mut report).await;
        }

        if search.probes() > 0 {
            info!(probes = search.probes(), "Index search finished");
        }
        table.save()?;
        Ok(report)
    }

    async fn download_date(&self, date: TradeDate, index: Index, report: &mut RunReport) {
        report.dates_attempted += 1;
        let outcome = self.downloader.download(date, index).await;

        report.files_downloaded += outcome.files_downloaded() as u64;
        report.files_failed += outcome.files_failed() as u64;
        match outcome {
            DateOutcome::AlreadyDownloaded => report.dates_skipped += 1,
            DateOutcome::Downloaded { .. } => report.dates_downloaded += 1,
            DateOutcome::Partial { failed, .. } => {
                warn!(
                    %date,
                    index,
                    failed = failed.len(),
                    path = %self.downloader.recovery_log().path().display(),
                    "Date {} recorded for recovery", date
                );
            }
        }
    }
}
