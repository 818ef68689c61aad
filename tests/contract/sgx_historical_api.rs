//! Contract tests for the SGX derivatives historical endpoint
//!
//! These hit the live service and are ignored by default.

use sgx_derivatives_downloader::config::DownloaderConfig;
use sgx_derivatives_downloader::fetcher::sgx_http::SgxHttpFetcher;
use sgx_derivatives_downloader::fetcher::Fetcher;
use sgx_derivatives_downloader::{DataType, DateIndexResolver, ResolvedDate, TradeDate};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
#[ignore] // Requires network access
async fn test_anchor_index_resolves_to_anchor_date() {
    let temp_dir = TempDir::new().unwrap();
    let config = DownloaderConfig::default().with_index_dir(temp_dir.path());
    let fetcher = Arc::new(SgxHttpFetcher::new(&config).expect("Failed to build client"));
    let resolver = DateIndexResolver::new(fetcher, &config);

    assert_eq!(
        resolver.resolve(5523).await,
        ResolvedDate::Date(TradeDate::from_ymd(2023, 10, 6).unwrap())
    );
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_trade_cancellation_headers() {
    let config = DownloaderConfig::default();
    let fetcher = SgxHttpFetcher::new(&config).expect("Failed to build client");

    let meta = fetcher
        .fetch_metadata(5523, DataType::TradeCancellation)
        .await
        .expect("Failed to fetch metadata");

    assert_eq!(meta.filename().unwrap(), "TC_20231006.txt");
}
