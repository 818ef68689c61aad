//! HTTP fetcher for the SGX derivatives historical service
//!
//! Every file lives at `<base_url>/<index>/<file>`. Resolution only reads the
//! response headers; the body is dropped unread. No retries happen here: a
//! failed request is reported to the caller, which records it for a later run.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_LENGTH};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::DownloaderConfig;
use crate::fetcher::{DownloadStream, Fetcher, FetcherError, FetcherResult, ResponseMetadata};
use crate::{DataType, Index};

/// reqwest-backed [`Fetcher`]
pub struct SgxHttpFetcher {
    client: Client,
    config: DownloaderConfig,
}

impl SgxHttpFetcher {
    /// Create a fetcher for the configured base URL
    pub fn new(config: &DownloaderConfig) -> FetcherResult<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("Failed to build client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: Client, config: &DownloaderConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn send(
        &self,
        index: Index,
        data_type: DataType,
        timeout: Option<Duration>,
    ) -> FetcherResult<reqwest::Response> {
        let url = self.config.file_url(index, data_type);
        debug!(%url, index, "Sending GET request");

        let mut request = self.client.get(&url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetcherError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetcher for SgxHttpFetcher {
    async fn fetch_metadata(
        &self,
        index: Index,
        data_type: DataType,
    ) -> FetcherResult<ResponseMetadata> {
        let response = self
            .send(index, data_type, Some(self.config.resolve_timeout))
            .await?;
        metadata_from_headers(response.headers())
    }

    async fn fetch_stream(
        &self,
        index: Index,
        data_type: DataType,
    ) -> FetcherResult<DownloadStream> {
        let timeout = self.config.download_timeout;
        let response = self.send(index, data_type, timeout).await?;
        let total_len = response.content_length();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| map_request_error(e, timeout)));

        Ok(DownloadStream {
            total_len,
            body: Box::pin(body),
        })
    }
}

fn map_request_error(error: reqwest::Error, timeout: Option<Duration>) -> FetcherError {
    match timeout {
        Some(timeout) if error.is_timeout() => FetcherError::Timeout(timeout),
        _ => FetcherError::NetworkError(error.to_string()),
    }
}

/// Extract the metadata fields from response headers
///
/// Headers that are present but not valid visible ASCII (or, for the length,
/// not a number) are reported as [`FetcherError::InvalidHeader`].
pub fn metadata_from_headers(headers: &HeaderMap) -> FetcherResult<ResponseMetadata> {
    let content_disposition = headers
        .get(CONTENT_DISPOSITION)
        .map(|value| {
            value
                .to_str()
                .map(str::to_string)
                .map_err(|e| FetcherError::InvalidHeader(format!("Content-Disposition: {e}")))
        })
        .transpose()?;

    let content_length = headers
        .get(CONTENT_LENGTH)
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .ok_or_else(|| FetcherError::InvalidHeader(format!("Content-Length: {value:?}")))
        })
        .transpose()?;

    Ok(ResponseMetadata {
        content_disposition,
        content_length,
    })
}
