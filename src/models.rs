// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A contiguous byte range of the remote resource, fetched independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    /// Dense, 0-based position of this segment in the output file.
    pub index: usize,
    pub start_byte: u64,
    /// Number of bytes covered. Only the single segment of an empty
    /// resource has a length of zero.
    pub len: u64,
}

impl Segment {
    /// Inclusive last byte of the segment, `None` when the segment is empty.
    pub fn end_byte(&self) -> Option<u64> {
        self.len.checked_sub(1).map(|n| self.start_byte + n)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value for the `Range` request header, e.g. `bytes=0-1023`.
    pub fn range_header(&self) -> Option<String> {
        self.end_byte()
            .map(|end| format!("bytes={}-{}", self.start_byte, end))
    }
}

/// Bytes delivered for one segment.
///
/// `bytes_read` is authoritative: the buffer is allocated for the full
/// segment up front and may hold fewer bytes if the server closed early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentResult {
    pub index: usize,
    pub data: Vec<u8>,
    pub bytes_read: usize,
}

impl SegmentResult {
    pub fn new(index: usize, data: Vec<u8>) -> Self {
        let bytes_read = data.len();
        Self { index, data, bytes_read }
    }

    /// The delivered bytes, truncated to `bytes_read`.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.bytes_read.min(self.data.len())]
    }
}

/// What the probe request learned about the remote resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// `None` when the server omitted `Content-Length` or sent garbage.
    pub content_length: Option<u64>,
    pub content_type: String,
    /// Raw response headers, each name mapped to its values in arrival order.
    pub headers: BTreeMap<String, Vec<String>>,
}

impl ResourceMetadata {
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let mut raw: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in headers {
            raw.entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let content_length = headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        Self { content_length, content_type, headers: raw }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DownloadSummary {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub segments: usize,
    pub content_type: String,
    pub content_length: u64,
    pub elapsed_ms: u128,
}
