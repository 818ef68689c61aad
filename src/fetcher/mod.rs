//! Network collaborator
//!
//! The [`Fetcher`] trait is the only seam between the index logic and the
//! upstream service. It answers two questions: what metadata does the file
//! published under an index carry, and what are its bytes.

use crate::{DataType, Index};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;

pub mod filename;
pub mod sgx_http;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Connection or transport error
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Request did not complete in time
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Required response header absent
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    /// Response header present but unusable
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Local IO failure while handling a response
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Stream of body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = FetcherResult<Bytes>> + Send>>;

/// Header fields the resolver and downloader care about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    /// Raw `Content-Disposition` value
    pub content_disposition: Option<String>,
    /// `Content-Length` value
    pub content_length: Option<u64>,
}

impl ResponseMetadata {
    /// Metadata carrying only a `Content-Disposition` value
    pub fn with_disposition(value: impl Into<String>) -> Self {
        Self {
            content_disposition: Some(value.into()),
            content_length: None,
        }
    }

    /// Filename announced by `Content-Disposition` (text after the first `=`)
    pub fn filename(&self) -> FetcherResult<&str> {
        let disposition = self
            .content_disposition
            .as_deref()
            .ok_or(FetcherError::MissingHeader("Content-Disposition"))?;
        let (_, filename) = disposition.split_once('=').ok_or_else(|| {
            FetcherError::InvalidHeader(format!("no filename in Content-Disposition: {disposition}"))
        })?;
        Ok(filename.trim().trim_matches('"'))
    }
}

/// Body of a published file
pub struct DownloadStream {
    /// Announced total length, if any
    pub total_len: Option<u64>,
    /// Body chunks
    pub body: ByteStream,
}

impl std::fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStream")
            .field("total_len", &self.total_len)
            .finish_non_exhaustive()
    }
}

/// Access to the files published under each index
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch response metadata for `data_type` under `index` without the body
    async fn fetch_metadata(&self, index: Index, data_type: DataType)
        -> FetcherResult<ResponseMetadata>;

    /// Open the body of `data_type` under `index` as a chunk stream
    async fn fetch_stream(&self, index: Index, data_type: DataType)
        -> FetcherResult<DownloadStream>;
}
