use reqwest::header::{CONNECTION, CONTENT_TYPE, RANGE};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DownloadSpec;
use crate::models::{Segment, SegmentResult};

/// Errors raised while fetching a single segment.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("segment {segment}: server answered {status}")]
    Status { segment: usize, status: StatusCode },
    #[error("segment {segment}: server ignored the range request and sent the whole resource")]
    RangeNotSatisfied { segment: usize },
    #[error("segment {segment}: expected at most {expected} bytes, received {received}")]
    Overrun { segment: usize, expected: u64, received: u64 },
    #[error("segment {0} cancelled")]
    Cancelled(usize),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled(_))
    }
}

/// Builds the HTTP client shared by the probe and the segment fetches.
///
/// HTTP/1 only and no idle pool, so every request opens its own connection
/// and segments never share a socket. The spec timeout bounds connecting and
/// each read, not the whole transfer.
pub fn build_client(spec: &DownloadSpec) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(spec.user_agent.as_str())
        .http1_only()
        .pool_max_idle_per_host(0)
        .connect_timeout(spec.timeout)
        .read_timeout(spec.timeout)
        .build()
}

/// Fetches byte ranges of one resource.
#[derive(Debug, Clone)]
pub struct SegmentFetcher {
    client: Client,
    url: String,
    content_type: String,
    content_length: u64,
}

impl SegmentFetcher {
    pub fn new(client: Client, url: impl Into<String>, content_type: impl Into<String>, content_length: u64) -> Self {
        Self {
            client,
            url: url.into(),
            content_type: content_type.into(),
            content_length,
        }
    }

    /// Downloads one segment into memory.
    ///
    /// A body shorter than the segment is returned as-is with its real byte
    /// count. A `200 OK` is only accepted when the segment spans the whole
    /// resource, since otherwise the server ignored the range. The token is
    /// checked before the request and between body chunks.
    pub async fn fetch(&self, segment: Segment, cancel: &CancellationToken) -> Result<SegmentResult, FetchError> {
        let Some(range) = segment.range_header() else {
            return Ok(SegmentResult::new(segment.index, Vec::new()));
        };
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled(segment.index));
        }

        debug!(segment = segment.index, range = %range, "requesting segment");
        let request = self.client.get(&self.url)
            .header(RANGE, range)
            .header(CONNECTION, "Keep-Alive")
            .header(CONTENT_TYPE, self.content_type.as_str());

        let mut resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled(segment.index)),
            resp = request.send() => resp?,
        };

        let status = resp.status();
        let whole_resource = segment.start_byte == 0 && segment.len == self.content_length;
        if status == StatusCode::OK && !whole_resource {
            return Err(FetchError::RangeNotSatisfied { segment: segment.index });
        }
        if status != StatusCode::PARTIAL_CONTENT && status != StatusCode::OK {
            return Err(FetchError::Status { segment: segment.index, status });
        }

        let mut data = Vec::with_capacity(segment.len as usize);
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled(segment.index)),
                chunk = resp.chunk() => chunk?,
            };
            let Some(bytes) = chunk else { break };

            let received = (data.len() + bytes.len()) as u64;
            if received > segment.len {
                return Err(FetchError::Overrun { segment: segment.index, expected: segment.len, received });
            }
            data.extend_from_slice(&bytes);
        }

        if (data.len() as u64) < segment.len {
            warn!(segment = segment.index, expected = segment.len, received = data.len(), "segment body ended early");
        }
        Ok(SegmentResult::new(segment.index, data))
    }
}
