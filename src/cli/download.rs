//! Download command implementation

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::CliError;
use crate::config::{
    DownloaderConfig, DEFAULT_BASE_URL, DEFAULT_DATA_DIR, DEFAULT_INDEX_DIR,
};
use crate::downloader::{DownloadError, DownloadExecutor, DownloadJob, RunReport};
use crate::fetcher::sgx_http::SgxHttpFetcher;
use crate::TradeDate;

/// Default log file written next to the working directory
pub const DEFAULT_LOG_FILE: &str = "download.log";

/// SGX derivatives historical data downloader
///
/// Without dates, fetches the newest publication. With `--begin-date` and
/// `--end-date`, recovers every date in the inclusive range.
#[derive(Parser, Debug)]
#[command(name = "sgx-derivatives-downloader")]
#[command(about = "Download SGX derivatives historical data files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// First date to recover (YYYY-MM-DD)
    #[arg(short = 'b', long, value_parser = TradeDate::parse_iso, requires = "end_date")]
    pub begin_date: Option<TradeDate>,

    /// Last date to recover (YYYY-MM-DD)
    #[arg(short = 'e', long, value_parser = TradeDate::parse_iso, requires = "begin_date")]
    pub end_date: Option<TradeDate>,

    /// Root folder for downloaded files
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Folder for the index table, cursor and recovery logs
    #[arg(long, default_value = DEFAULT_INDEX_DIR)]
    pub index_dir: PathBuf,

    /// Base URL of the historical data service
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Timeout in seconds for each index resolution request
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout_secs: u64,

    /// Output format (json or human)
    #[arg(long, default_value = "human")]
    pub output_format: OutputFormat,

    /// File that receives a plain text copy of the log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Do not write a log file
    #[arg(long, default_value_t = false)]
    pub no_log_file: bool,
}

impl Cli {
    /// Job selected by the date flags
    pub fn job(&self) -> Result<DownloadJob, CliError> {
        match (self.begin_date, self.end_date) {
            (Some(begin), Some(end)) => {
                if begin > end {
                    return Err(CliError::InvalidArgument(format!(
                        "begin date {begin} is after end date {end}"
                    )));
                }
                Ok(DownloadJob::Recovery { begin, end })
            }
            (None, None) => Ok(DownloadJob::Daily),
            _ => Err(CliError::InvalidArgument(
                "--begin-date and --end-date must be given together".to_string(),
            )),
        }
    }

    /// Configuration built from the flags
    pub fn config(&self) -> Result<DownloaderConfig, CliError> {
        let config = DownloaderConfig::default()
            .with_base_url(self.base_url.clone())
            .with_data_dir(self.data_dir.clone())
            .with_index_dir(self.index_dir.clone())
            .with_resolve_timeout(Duration::from_secs(self.timeout_secs));
        config.validate()?;
        Ok(config)
    }

    /// Log file path, unless disabled
    pub fn log_path(&self) -> Option<&PathBuf> {
        (!self.no_log_file).then_some(&self.log_file)
    }

    /// Run the selected job and print its report
    pub async fn execute(&self) -> Result<RunReport, CliError> {
        let job = self.job()?;
        let config = self.config()?;

        info!(
            job = %job.kind(),
            base_url = %config.base_url,
            data_dir = %config.data_dir.display(),
            index_dir = %config.index_dir.display(),
            "Starting run"
        );

        let fetcher = Arc::new(SgxHttpFetcher::new(&config)?);
        let executor = DownloadExecutor::new(config, fetcher)
            .with_progress(matches!(self.output_format, OutputFormat::Human));

        let result = executor.execute(job).await;
        match self.output_format {
            OutputFormat::Json => output_json(&result),
            OutputFormat::Human => output_human(&result),
        }
        Ok(result?)
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

fn output_json(result: &Result<RunReport, DownloadError>) {
    let output = match result {
        Ok(report) => serde_json::json!({
            "success": true,
            "report": report,
        }),
        Err(e) => serde_json::json!({
            "success": false,
            "error": e.to_string(),
        }),
    };
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Failed to serialize report: {}", e),
    }
}

fn output_human(result: &Result<RunReport, DownloadError>) {
    match result {
        Ok(report) => {
            println!("\n{}", report.summary());
            if let Some(latest) = report.latest {
                println!("Latest: {} (index {})", latest.date, latest.index);
            }
            if !report.is_clean() {
                println!(
                    "{} file(s) failed; affected dates were added to the recovery log",
                    report.files_failed
                );
            }
        }
        Err(e) => {
            eprintln!("\nDownload failed!");
            eprintln!("Error: {e}");
            error!("Download failed: {}", e);
        }
    }
}
