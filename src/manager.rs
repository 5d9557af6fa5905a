// src/manager.rs

use crate::assembler::{self, AssembleError};
use crate::barrier::CompletionBarrier;
use crate::config::{ConfigError, DownloadSpec};
use crate::downloader::{self, FetchError, SegmentFetcher};
use crate::models::{DownloadSummary, ResourceMetadata, SegmentResult};
use crate::progress::{NoopProgress, ProgressObserver};
use crate::segmenter::{self, SegmentError};
use crate::store::{ResultsStore, StoreError};
use futures_util::future::join_all;
use reqwest::header::{CONNECTION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why the probe request could not establish the resource size.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("probe request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("probe answered {0}")]
    Status(StatusCode),
    #[error("server did not report a content length")]
    UnknownLength,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("configuration error: {0}")]
    Segmentation(#[from] SegmentError),
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("segment fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invariant violated: {0}")]
    Invariant(#[from] StoreError),
    #[error("worker for segment {0} panicked")]
    WorkerPanicked(usize),
}

impl From<AssembleError> for DownloadError {
    fn from(e: AssembleError) -> Self {
        match e {
            AssembleError::Write { path, source } => DownloadError::Write { path, source },
            AssembleError::Invariant(e) => DownloadError::Invariant(e),
        }
    }
}

/// Terminal state of one run: the written file, or the first error observed.
pub type DownloadOutcome = Result<DownloadSummary, DownloadError>;

/// State shared by every segment task of a single run.
struct RunState {
    store: ResultsStore,
    failed: AtomicBool,
    first_error: Mutex<Option<DownloadError>>,
    completed: AtomicUsize,
    total: usize,
    cancel: CancellationToken,
}

impl RunState {
    /// Latches the failure flag, keeps the first error and stops the siblings.
    async fn fail(&self, err: DownloadError) {
        {
            let mut slot = self.first_error.lock().await;
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.failed.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }

    async fn record(&self, index: usize, outcome: Result<SegmentResult, FetchError>, progress: &dyn ProgressObserver) {
        match outcome {
            Ok(result) => {
                let bytes = result.bytes_read;
                if let Err(e) = self.store.insert(result) {
                    error!(segment = index, error = %e, "results store rejected segment");
                    self.fail(e.into()).await;
                    return;
                }
                let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(segment = index, bytes, completed, total = self.total, "segment stored");
                progress.on_segment_complete(completed, self.total);
            }
            Err(e) if e.is_cancelled() => {
                debug!(segment = index, "segment skipped after cancellation");
                self.fail(e.into()).await;
            }
            Err(e) => {
                warn!(segment = index, error = %e, "segment failed");
                self.fail(e.into()).await;
            }
        }
    }
}

/// Drives a single download from probe to assembled file.
pub struct DownloadCoordinator {
    progress: Arc<dyn ProgressObserver>,
    shutdown: CancellationToken,
}

impl Default for DownloadCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadCoordinator {
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoopProgress),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    /// Cancelling this token aborts any run in progress; the run then fails.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Issues the unranged probe and reads the resource metadata.
    ///
    /// Only the headers are read; the body is dropped unread.
    pub async fn probe(&self, client: &Client, spec: &DownloadSpec) -> Result<ResourceMetadata, ConnectionError> {
        let resp = client.get(&spec.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONNECTION, "Keep-Alive")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ConnectionError::Status(resp.status()));
        }
        let meta = ResourceMetadata::from_headers(resp.headers());
        drop(resp);

        info!(url = %spec.url, content_type = %meta.content_type, content_length = ?meta.content_length, "probed resource");
        for (name, values) in &meta.headers {
            debug!(header = %name, values = ?values, "probe header");
        }
        Ok(meta)
    }

    pub async fn run(&self, spec: &DownloadSpec) -> DownloadOutcome {
        spec.validate()?;
        let started = Instant::now();
        let client = downloader::build_client(spec).map_err(ConnectionError::Request)?;

        let meta = self.probe(&client, spec).await?;
        let content_length = meta.content_length.ok_or(ConnectionError::UnknownLength)?;

        let segments = segmenter::compute_segments(content_length, spec.segment_size)?;
        let total = segments.len();
        let pool_size = spec.workers.min(total).max(1);
        info!(segments = total, workers = pool_size, segment_size = spec.segment_size, "dispatching segments");

        let state = Arc::new(RunState {
            store: ResultsStore::with_capacity(total),
            failed: AtomicBool::new(false),
            first_error: Mutex::new(None),
            completed: AtomicUsize::new(0),
            total,
            cancel: self.shutdown.child_token(),
        });
        let barrier = CompletionBarrier::new(total);
        let semaphore = Arc::new(Semaphore::new(pool_size));
        let fetcher = SegmentFetcher::new(client, spec.url.clone(), meta.content_type.clone(), content_length);

        // Permits are taken here, before spawning, so at most `pool_size`
        // segment tasks exist at any time.
        let mut handles = Vec::with_capacity(total);
        for segment in segments {
            let guard = barrier.guard();
            let permit = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                state.record(segment.index, Err(FetchError::Cancelled(segment.index)), self.progress.as_ref()).await;
                guard.arrive();
                continue;
            };

            let state = state.clone();
            let fetcher = fetcher.clone();
            let progress = self.progress.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome = fetcher.fetch(segment, &state.cancel).await;
                state.record(segment.index, outcome, progress.as_ref()).await;
                guard.arrive();
            });
            handles.push((segment.index, handle));
        }

        barrier.wait().await;

        let (indices, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        for (index, joined) in indices.into_iter().zip(join_all(handles).await) {
            if let Err(e) = joined {
                error!(segment = index, error = %e, "segment worker did not finish");
                state.fail(DownloadError::WorkerPanicked(index)).await;
            }
        }
        self.progress.on_finish();

        if state.failed.load(Ordering::SeqCst) {
            let err = state
                .first_error
                .lock()
                .await
                .take()
                .unwrap_or(DownloadError::WorkerPanicked(0));
            error!(error = %err, "download failed, no file written");
            return Err(err);
        }

        let (path, bytes_written) = assembler::assemble(&state.store, total, &meta.content_type, spec.destination.as_deref()).await?;
        info!(path = %path.display(), bytes = bytes_written, "download complete");

        Ok(DownloadSummary {
            path,
            bytes_written,
            segments: total,
            content_type: meta.content_type,
            content_length,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}

/// Runs one download with a fresh coordinator and no progress reporting.
pub async fn download(spec: &DownloadSpec) -> DownloadOutcome {
    DownloadCoordinator::new().run(spec).await
}
