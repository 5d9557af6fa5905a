// src/config.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_SEGMENT_SIZE: u64 = 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("segdl/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("download url must not be blank")]
    BlankUrl,
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("segment size must be at least 1 byte")]
    ZeroSegmentSize,
}

/// Everything needed to run one download, resolved before any network I/O.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadSpec {
    pub url: String,
    /// Upper bound on concurrently running segment fetches.
    pub workers: usize,
    pub segment_size: u64,
    /// Directory the output file is written to; the current directory when `None`.
    pub destination: Option<PathBuf>,
    /// Bounds connecting and each individual read; a slow but steady body
    /// is never cut off.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for DownloadSpec {
    fn default() -> Self {
        Self {
            url: String::new(),
            workers: DEFAULT_WORKERS,
            segment_size: DEFAULT_SEGMENT_SIZE,
            destination: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloadSpec {
    /// Builds a spec from loosely typed caller input.
    ///
    /// Missing or negative knobs silently fall back to the defaults; an
    /// explicit zero is rejected since neither a pool nor a segment can be
    /// empty.
    pub fn resolve(
        url: impl Into<String>,
        workers: Option<i64>,
        segment_size: Option<i64>,
        destination: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ConfigError::BlankUrl);
        }

        let workers = match workers {
            None => DEFAULT_WORKERS,
            Some(n) if n < 0 => DEFAULT_WORKERS,
            Some(0) => return Err(ConfigError::ZeroWorkers),
            Some(n) => n as usize,
        };
        let segment_size = match segment_size {
            None => DEFAULT_SEGMENT_SIZE,
            Some(n) if n < 0 => DEFAULT_SEGMENT_SIZE,
            Some(0) => return Err(ConfigError::ZeroSegmentSize),
            Some(n) => n as u64,
        };

        Ok(Self {
            url,
            workers,
            segment_size,
            destination,
            ..Self::default()
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Re-checks a spec that was built field by field instead of via [`resolve`](Self::resolve).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::BlankUrl);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.segment_size == 0 {
            return Err(ConfigError::ZeroSegmentSize);
        }
        Ok(())
    }
}
