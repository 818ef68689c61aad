//! Download jobs and run reports

use serde::Serialize;

use super::DownloadError;
use crate::index::Cursor;
use crate::TradeDate;

/// What a run should fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadJob {
    /// Advance to the newest publication and fetch it
    Daily,
    /// Fetch every date in `begin..=end`, newest first
    Recovery {
        /// First date of the range
        begin: TradeDate,
        /// Last date of the range
        end: TradeDate,
    },
}

impl DownloadJob {
    /// Check the job before any network access
    pub fn validate(&self) -> Result<(), DownloadError> {
        match *self {
            DownloadJob::Daily => Ok(()),
            DownloadJob::Recovery { begin, end } if begin > end => {
                Err(DownloadError::InvalidRange { begin, end })
            }
            DownloadJob::Recovery { .. } => Ok(()),
        }
    }

    /// Kind of job, for reporting
    pub fn kind(&self) -> JobKind {
        match self {
            DownloadJob::Daily => JobKind::Daily,
            DownloadJob::Recovery { .. } => JobKind::Recovery,
        }
    }

    /// Dates of a recovery job from `end` back to `begin`
    pub fn dates(&self) -> Vec<TradeDate> {
        let DownloadJob::Recovery { begin, end } = *self else {
            return Vec::new();
        };

        let mut dates = Vec::new();
        let mut current = Some(end);
        while let Some(date) = current {
            if date < begin {
                break;
            }
            dates.push(date);
            current = date.pred();
        }
        dates
    }
}

/// Job kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Daily fetch
    Daily,
    /// Date range recovery
    Recovery,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Daily => write!(f, "daily"),
            JobKind::Recovery => write!(f, "recovery"),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Job kind
    pub job: JobKind,
    /// Dates a download was attempted for
    pub dates_attempted: u64,
    /// Dates whose files were all fetched by this run
    pub dates_downloaded: u64,
    /// Dates already complete on disk
    pub dates_skipped: u64,
    /// Dates no index could be found for
    pub dates_not_found: u64,
    /// Files written
    pub files_downloaded: u64,
    /// Files that failed
    pub files_failed: u64,
    /// Latest cursor after a daily run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<Cursor>,
}

impl RunReport {
    /// Empty report for `job`
    pub fn new(job: JobKind) -> Self {
        Self {
            job,
            dates_attempted: 0,
            dates_downloaded: 0,
            dates_skipped: 0,
            dates_not_found: 0,
            files_downloaded: 0,
            files_failed: 0,
            latest: None,
        }
    }

    /// Whether every attempted file arrived
    pub fn is_clean(&self) -> bool {
        self.files_failed == 0
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} run: {} dates attempted, {} downloaded, {} skipped, {} not found; {} files downloaded, {} failed",
            self.job,
            self.dates_attempted,
            self.dates_downloaded,
            self.dates_skipped,
            self.dates_not_found,
            self.files_downloaded,
            self.files_failed
        );
        if let Some(latest) = self.latest {
            summary.push_str(&format!("; latest {latest}"));
        }
        summary
    }
}
