//! Unit tests for date to index search

use crate::common::scripted_fetcher::{Script, ScriptedFetcher};
use sgx_derivatives_downloader::config::DownloaderConfig;
use sgx_derivatives_downloader::index::IndexError;
use sgx_derivatives_downloader::{DateIndexResolver, DateToIndexSearch, TradeDate};
use std::sync::Arc;
use tempfile::TempDir;

fn search(temp_dir: &TempDir, fetcher: &Arc<ScriptedFetcher>) -> DateToIndexSearch {
    let config = DownloaderConfig::default()
        .with_index_dir(temp_dir.path().join("index_tables"))
        .with_data_dir(temp_dir.path().join("files"));
    let resolver = DateIndexResolver::new(fetcher.clone(), &config);
    DateToIndexSearch::new(resolver, &config)
}

fn date(s: &str) -> TradeDate {
    s.parse().unwrap()
}

#[test]
fn test_candidates_alternate_around_anchor() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    let search = search(&temp_dir, &fetcher);

    assert_eq!(search.window(date("20231004")), 2);
    let candidates: Vec<u64> = search.candidates(date("20231004")).collect();
    assert_eq!(candidates, vec![5524, 5522, 5525, 5521]);
}

#[tokio::test]
async fn test_find_previous_day() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().with_dates(&[(5522, "20231005")]));
    let mut search = search(&temp_dir, &fetcher);

    assert_eq!(search.find_index(date("20231005")).await.unwrap(), 5522);
    // 5524 first, then 5522
    assert_eq!(search.probes(), 2);
}

#[tokio::test]
async fn test_anchor_date_needs_no_probe() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    let mut search = search(&temp_dir, &fetcher);

    assert_eq!(search.find_index(date("20231006")).await.unwrap(), 5523);
    assert_eq!(fetcher.metadata_calls(), 0);
}

#[tokio::test]
async fn test_not_found_after_window() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().with_dates(&[
        (5522, "20231005"),
        (5521, "20231004"),
    ]));
    let mut search = search(&temp_dir, &fetcher);

    // Saturday: nothing carries it
    let result = search.find_index(date("20230930")).await;

    assert!(matches!(result, Err(IndexError::NotFound(d)) if d == date("20230930")));
    assert_eq!(search.probes(), 12);
}

#[tokio::test]
async fn test_probe_results_are_cached() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().with_dates(&[
        (5522, "20231005"),
        (5521, "20231004"),
    ]));
    let mut search = search(&temp_dir, &fetcher);

    search.find_index(date("20231005")).await.unwrap();
    search.find_index(date("20231004")).await.unwrap();

    // 5524 and 5522 were answered from the cache on the second search
    assert_eq!(fetcher.metadata_calls(), 4);
}

#[tokio::test]
async fn test_failed_probes_are_retried() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with(5524, Script::Fail)
            .with_dates(&[(5522, "20231005")]),
    );
    let mut search = search(&temp_dir, &fetcher);

    search.find_index(date("20231005")).await.unwrap();
    search.find_index(date("20231005")).await.unwrap();

    assert_eq!(search.probes(), 3);
}

#[tokio::test]
async fn test_target_after_anchor() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().with_dates(&[(5524, "20231009")]));
    let mut search = search(&temp_dir, &fetcher);

    assert_eq!(search.find_index(date("20231009")).await.unwrap(), 5524);
}
