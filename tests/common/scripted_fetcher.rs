//! In-memory fetcher answering from a fixed script

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use sgx_derivatives_downloader::fetcher::{
    DownloadStream, Fetcher, FetcherError, FetcherResult, ResponseMetadata,
};
use sgx_derivatives_downloader::{DataType, Index};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// What an index answers with
#[derive(Debug, Clone)]
pub enum Script {
    /// Publication for a `YYYYMMDD` date
    Date(&'static str),
    /// Response whose filename carries no date
    Empty,
    /// Response without a `Content-Disposition` header
    NoDisposition,
    /// Transport failure
    Fail,
}

/// Scripted [`Fetcher`]; unscripted indices answer [`Script::Empty`]
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<Index, Script>>,
    failing_types: HashSet<DataType>,
    truncated_types: HashSet<DataType>,
    metadata_calls: AtomicU64,
    stream_calls: AtomicU64,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, index: Index, script: Script) -> Self {
        self.set(index, script);
        self
    }

    pub fn with_dates(self, pairs: &[(Index, &'static str)]) -> Self {
        for &(index, date) in pairs {
            self.set(index, Script::Date(date));
        }
        self
    }

    /// Every download of `data_type` fails with HTTP 404
    pub fn failing(mut self, data_type: DataType) -> Self {
        self.failing_types.insert(data_type);
        self
    }

    /// Every download of `data_type` announces more bytes than it sends
    pub fn truncated(mut self, data_type: DataType) -> Self {
        self.truncated_types.insert(data_type);
        self
    }

    pub fn set(&self, index: Index, script: Script) {
        self.scripts.lock().unwrap().insert(index, script);
    }

    pub fn metadata_calls(&self) -> u64 {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> u64 {
        self.stream_calls.load(Ordering::SeqCst)
    }

    fn script(&self, index: Index) -> Script {
        self.scripts
            .lock()
            .unwrap()
            .get(&index)
            .cloned()
            .unwrap_or(Script::Empty)
    }
}

/// Body served for `data_type` under `index`
pub fn body_for(index: Index, data_type: DataType) -> Vec<u8> {
    format!("{index}:{}\n", data_type.remote_name())
        .repeat(8)
        .into_bytes()
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch_metadata(
        &self,
        index: Index,
        _data_type: DataType,
    ) -> FetcherResult<ResponseMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        match self.script(index) {
            Script::Date(date) => Ok(ResponseMetadata::with_disposition(format!(
                "attachment; filename=TC_{date}.txt"
            ))),
            Script::Empty => Ok(ResponseMetadata::with_disposition(
                "attachment; filename=TC.txt",
            )),
            Script::NoDisposition => Ok(ResponseMetadata::default()),
            Script::Fail => Err(FetcherError::NetworkError(format!(
                "connection reset while resolving {index}"
            ))),
        }
    }

    async fn fetch_stream(&self, index: Index, data_type: DataType) -> FetcherResult<DownloadStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_types.contains(&data_type) {
            return Err(FetcherError::HttpStatus {
                status: 404,
                url: format!("scripted://{index}/{}", data_type.remote_name()),
            });
        }

        let body = body_for(index, data_type);
        let mut total_len = body.len() as u64;
        if self.truncated_types.contains(&data_type) {
            total_len += 10;
        }

        let chunks: Vec<FetcherResult<Bytes>> = body
            .chunks(7)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();

        Ok(DownloadStream {
            total_len: Some(total_len),
            body: Box::pin(stream::iter(chunks)),
        })
    }
}
