//! Unit tests for the latest index cursor

use crate::common::scripted_fetcher::{Script, ScriptedFetcher};
use sgx_derivatives_downloader::config::DownloaderConfig;
use sgx_derivatives_downloader::index::Cursor;
use sgx_derivatives_downloader::{DateIndexResolver, LatestIndexTracker, TradeDate};
use std::sync::Arc;
use tempfile::TempDir;

fn tracker(temp_dir: &TempDir, fetcher: &Arc<ScriptedFetcher>) -> LatestIndexTracker {
    let config = DownloaderConfig::default()
        .with_index_dir(temp_dir.path().join("index_tables"))
        .with_data_dir(temp_dir.path().join("files"));
    let resolver = DateIndexResolver::new(fetcher.clone(), &config);
    LatestIndexTracker::new(resolver, &config)
}

fn date(s: &str) -> TradeDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_first_call_writes_anchor_without_probing() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().with_dates(&[(5524, "20231009")]));
    let tracker = tracker(&temp_dir, &fetcher);

    let cursor = tracker.get_latest().await.unwrap();

    assert_eq!(cursor, Cursor::new(date("20231006"), 5523));
    assert_eq!(fetcher.metadata_calls(), 0);
    assert_eq!(
        std::fs::read_to_string(tracker.path()).unwrap(),
        "20231006 5523"
    );
}

#[tokio::test]
async fn test_advances_until_empty_index() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dates(&[(5524, "20231009")])
            .with(5525, Script::Empty),
    );
    let tracker = tracker(&temp_dir, &fetcher);
    tracker.get_latest().await.unwrap();

    let cursor = tracker.get_latest().await.unwrap();

    assert_eq!(cursor, Cursor::new(date("20231009"), 5524));
    assert_eq!(fetcher.metadata_calls(), 2);
    assert_eq!(
        std::fs::read_to_string(tracker.path()).unwrap(),
        "20231009 5524"
    );
}

#[tokio::test]
async fn test_get_latest_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().with_dates(&[
        (5524, "20231009"),
        (5525, "20231010"),
    ]));
    let tracker = tracker(&temp_dir, &fetcher);
    tracker.get_latest().await.unwrap();

    let first = tracker.get_latest().await.unwrap();
    let second = tracker.get_latest().await.unwrap();

    assert_eq!(first, Cursor::new(date("20231010"), 5525));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_index_stops_advance() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_dates(&[(5524, "20231009"), (5526, "20231011")])
            .with(5525, Script::Fail),
    );
    let tracker = tracker(&temp_dir, &fetcher);
    tracker.get_latest().await.unwrap();

    let cursor = tracker.get_latest().await.unwrap();

    // 5526 is never probed
    assert_eq!(cursor, Cursor::new(date("20231009"), 5524));
    assert_eq!(fetcher.metadata_calls(), 2);
}

#[tokio::test]
async fn test_malformed_cursor_falls_back_to_anchor() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    let tracker = tracker(&temp_dir, &fetcher);
    std::fs::create_dir_all(tracker.path().parent().unwrap()).unwrap();
    std::fs::write(tracker.path(), "garbage").unwrap();

    assert_eq!(
        tracker.load().unwrap(),
        Some(Cursor::new(date("20231006"), 5523))
    );
}

#[tokio::test]
async fn test_load_without_file() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    let tracker = tracker(&temp_dir, &fetcher);

    assert_eq!(tracker.load().unwrap(), None);
}
