//! Bulk download of every file published for one date
//!
//! Files land in `<data_dir>/<date>/`. Each body is streamed into a temporary
//! file inside that folder and renamed into place once complete, so a
//! half-written file never carries a final name.

use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use super::progress::ByteProgress;
use super::DownloadError;
use crate::config::DownloaderConfig;
use crate::fetcher::Fetcher;
use crate::store::RecoveryLog;
use crate::{DataType, Index, TradeDate};

/// Result of downloading one date
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOutcome {
    /// Every expected file was already on disk; nothing was fetched
    AlreadyDownloaded,
    /// Every file was fetched
    Downloaded {
        /// Files written
        files: Vec<DataType>,
    },
    /// Some files failed; the date was recorded in the recovery log
    Partial {
        /// Files written
        downloaded: Vec<DataType>,
        /// Files that failed
        failed: Vec<DataType>,
    },
}

impl DateOutcome {
    /// Number of files written by this attempt
    pub fn files_downloaded(&self) -> usize {
        match self {
            DateOutcome::AlreadyDownloaded => 0,
            DateOutcome::Downloaded { files } => files.len(),
            DateOutcome::Partial { downloaded, .. } => downloaded.len(),
        }
    }

    /// Number of files that failed
    pub fn files_failed(&self) -> usize {
        match self {
            DateOutcome::Partial { failed, .. } => failed.len(),
            DateOutcome::AlreadyDownloaded | DateOutcome::Downloaded { .. } => 0,
        }
    }
}

/// Downloads all configured data types for a date
#[derive(Clone)]
pub struct DateDownloader {
    fetcher: Arc<dyn Fetcher>,
    config: DownloaderConfig,
    recovery_log: RecoveryLog,
    show_progress: bool,
}

impl DateDownloader {
    /// Create a downloader writing below `config.data_dir`
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &DownloaderConfig) -> Self {
        Self {
            fetcher,
            recovery_log: RecoveryLog::failed_dates(config.recovery_log_path()),
            config: config.clone(),
            show_progress: true,
        }
    }

    /// Enable or disable the terminal progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Log of dates whose download failed
    pub fn recovery_log(&self) -> &RecoveryLog {
        &self.recovery_log
    }

    /// Paths every configured file for `date` is stored under
    pub fn expected_files(&self, date: TradeDate) -> Vec<PathBuf> {
        let dir = self.config.date_dir(date);
        self.config
            .data_types
            .iter()
            .map(|data_type| dir.join(data_type.local_file_name(date)))
            .collect()
    }

    /// Whether every configured file for `date` is on disk
    pub fn is_downloaded(&self, date: TradeDate) -> bool {
        self.expected_files(date).iter().all(|path| path.is_file())
    }

    /// Fetch every configured file for `date` from `index`
    ///
    /// Files already on disk are kept. A failed file is logged and recorded;
    /// the remaining files are still attempted. A date folder that cannot be
    /// created fails every file of the date.
    pub async fn download(&self, date: TradeDate, index: Index) -> DateOutcome {
        if self.is_downloaded(date) {
            info!(%date, index, "Files for {} already downloaded", date);
            return DateOutcome::AlreadyDownloaded;
        }

        let dir = self.config.date_dir(date);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(
                %date,
                index,
                path = %dir.display(),
                error = %e,
                "Failed to create folder for {}", date
            );
            self.record_failure(date);
            return DateOutcome::Partial {
                downloaded: Vec::new(),
                failed: self.config.data_types.clone(),
            };
        }

        info!(%date, index, "Downloading files for {}", date);

        let mut downloaded = Vec::new();
        let mut failed = Vec::new();
        for &data_type in &self.config.data_types {
            let file_name = data_type.local_file_name(date);
            if dir.join(&file_name).is_file() {
                debug!(%date, file = %file_name, "Keeping {} from an earlier run", file_name);
                continue;
            }

            match self.download_file(index, data_type, &dir, &file_name).await {
                Ok(bytes) => {
                    info!(%date, index, file = %file_name, bytes, "Downloaded {}", file_name);
                    downloaded.push(data_type);
                }
                Err(e) => {
                    warn!(
                        %date,
                        index,
                        file = %file_name,
                        error = %e,
                        "Download of {} failed", file_name
                    );
                    self.record_failure(date);
                    failed.push(data_type);
                }
            }
        }

        if failed.is_empty() {
            DateOutcome::Downloaded { files: downloaded }
        } else {
            DateOutcome::Partial { downloaded, failed }
        }
    }

    async fn download_file(
        &self,
        index: Index,
        data_type: DataType,
        dir: &Path,
        file_name: &str,
    ) -> Result<u64, DownloadError> {
        let mut stream = self.fetcher.fetch_stream(index, data_type).await?;

        let mut progress = if self.show_progress {
            ByteProgress::new(file_name, stream.total_len, self.config.chunk_size)
        } else {
            ByteProgress::quiet(file_name, stream.total_len, self.config.chunk_size)
        };

        let mut temp_file = NamedTempFile::new_in(dir)
            .map_err(|e| DownloadError::Io(format!("Failed to create temp file: {e}")))?;

        while let Some(chunk) = stream.body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    progress.abandon();
                    return Err(e.into());
                }
            };
            temp_file
                .write_all(&chunk)
                .map_err(|e| DownloadError::Io(format!("Failed to write {file_name}: {e}")))?;
            progress.update(chunk.len() as u64);
        }

        if let Some(expected) = stream.total_len {
            let received = progress.bytes_so_far();
            if received != expected {
                progress.abandon();
                return Err(DownloadError::Incomplete { expected, received });
            }
        }

        temp_file
            .flush()
            .map_err(|e| DownloadError::Io(format!("Failed to flush {file_name}: {e}")))?;
        temp_file
            .persist(dir.join(file_name))
            .map_err(|e| DownloadError::Io(format!("Failed to persist {file_name}: {e}")))?;

        progress.finish();
        Ok(progress.bytes_so_far())
    }

    fn record_failure(&self, date: TradeDate) {
        if let Err(e) = self.recovery_log.append_unique(&date.to_string()) {
            error!(
                %date,
                path = %self.recovery_log.path().display(),
                error = %e,
                "Failed to record date in recovery log"
            );
        }
    }
}
