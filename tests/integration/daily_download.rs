//! Integration tests for the daily download flow

use crate::common::scripted_fetcher::{body_for, Script, ScriptedFetcher};
use sgx_derivatives_downloader::config::DownloaderConfig;
use sgx_derivatives_downloader::downloader::{DownloadError, DownloadExecutor, DownloadJob};
use sgx_derivatives_downloader::index::Cursor;
use sgx_derivatives_downloader::store::StoreLock;
use sgx_derivatives_downloader::{DataType, IndexTable, TradeDate};
use std::sync::Arc;
use tempfile::TempDir;

fn config(temp_dir: &TempDir) -> DownloaderConfig {
    DownloaderConfig::default()
        .with_index_dir(temp_dir.path().join("index_tables"))
        .with_data_dir(temp_dir.path().join("files"))
}

fn date(s: &str) -> TradeDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_first_daily_run_fetches_anchor_date() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let fetcher = Arc::new(ScriptedFetcher::new().with_dates(&[(5523, "20231006")]));
    let executor = DownloadExecutor::new(config.clone(), fetcher.clone()).with_progress(false);

    let report = executor.execute(DownloadJob::Daily).await.unwrap();

    assert_eq!(report.latest, Some(Cursor::new(date("20231006"), 5523)));
    assert_eq!(report.dates_downloaded, 1);
    assert_eq!(report.files_downloaded, 4);
    assert!(report.is_clean());

    let dir = temp_dir.path().join("files").join("20231006");
    for name in [
        "TC_20231006.txt",
        "TickData_structure.dat",
        "TC_structure.dat",
        "WEBPXTICK_DT-20231006.zip",
    ] {
        assert!(dir.join(name).is_file(), "missing {name}");
    }
    assert_eq!(
        std::fs::read(dir.join("TC_20231006.txt")).unwrap(),
        body_for(5523, DataType::TradeCancellation)
    );
    // Only the four data files: no temp files left behind
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 4);
}

#[tokio::test]
async fn test_second_daily_run_skips_downloaded_date() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dates(&[(5523, "20231006")])
            .with(5524, Script::Empty),
    );
    let executor = DownloadExecutor::new(config, fetcher.clone()).with_progress(false);

    executor.execute(DownloadJob::Daily).await.unwrap();
    let streams_after_first = fetcher.stream_calls();

    let report = executor.execute(DownloadJob::Daily).await.unwrap();

    assert_eq!(report.dates_skipped, 1);
    assert_eq!(report.dates_attempted, 0);
    assert_eq!(fetcher.stream_calls(), streams_after_first);
}

#[tokio::test]
async fn test_daily_run_follows_new_publication() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    std::fs::create_dir_all(&config.index_dir).unwrap();
    std::fs::write(config.latest_index_path(), "20231006 5523").unwrap();

    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dates(&[(5524, "20231009")])
            .with(5525, Script::Empty),
    );
    let executor = DownloadExecutor::new(config.clone(), fetcher).with_progress(false);

    let report = executor.execute(DownloadJob::Daily).await.unwrap();

    assert_eq!(report.latest, Some(Cursor::new(date("20231009"), 5524)));
    assert!(temp_dir
        .path()
        .join("files/20231009/WEBPXTICK_DT-20231009.zip")
        .is_file());

    let table = IndexTable::load(&config).unwrap();
    assert_eq!(table.get(date("20231009")), Some(5524));
    assert_eq!(
        std::fs::read_to_string(config.latest_index_path()).unwrap(),
        "20231009 5524"
    );
}

#[tokio::test]
async fn test_failed_file_is_recorded_and_others_continue() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dates(&[(5523, "20231006")])
            .failing(DataType::TickData),
    );
    let executor = DownloadExecutor::new(config.clone(), fetcher.clone()).with_progress(false);

    let report = executor.execute(DownloadJob::Daily).await.unwrap();

    assert_eq!(report.files_downloaded, 3);
    assert_eq!(report.files_failed, 1);
    assert_eq!(fetcher.stream_calls(), 4);
    assert_eq!(
        std::fs::read_to_string(config.recovery_log_path()).unwrap(),
        "20231006,"
    );

    // The incomplete date is retried on the next run, fetching only the missing file
    let report = executor.execute(DownloadJob::Daily).await.unwrap();
    assert_eq!(report.dates_attempted, 1);
    assert_eq!(report.files_downloaded, 0);
    assert_eq!(report.files_failed, 1);
    assert_eq!(fetcher.stream_calls(), 5);
    assert_eq!(
        std::fs::read_to_string(config.recovery_log_path()).unwrap(),
        "20231006,"
    );
}

#[tokio::test]
async fn test_truncated_body_is_not_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dates(&[(5523, "20231006")])
            .truncated(DataType::TradeCancellation),
    );
    let executor = DownloadExecutor::new(config, fetcher).with_progress(false);

    let report = executor.execute(DownloadJob::Daily).await.unwrap();

    assert_eq!(report.files_failed, 1);
    let dir = temp_dir.path().join("files").join("20231006");
    assert!(!dir.join("TC_20231006.txt").exists());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 3);
}

#[tokio::test]
async fn test_concurrent_run_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir);
    let fetcher = Arc::new(ScriptedFetcher::new());
    let executor = DownloadExecutor::new(config.clone(), fetcher.clone()).with_progress(false);

    let mut lock = StoreLock::open(&config.lock_path()).unwrap();
    let _guard = lock.try_exclusive().unwrap();

    let result = executor.execute(DownloadJob::Daily).await;

    assert!(matches!(result, Err(DownloadError::Store(_))));
    assert_eq!(fetcher.metadata_calls(), 0);
}
