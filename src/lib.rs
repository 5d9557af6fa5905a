pub mod args;
pub mod assembler;
pub mod barrier;
pub mod config;
pub mod downloader;
pub mod manager;
pub mod mime;
pub mod models;
pub mod progress;
pub mod segmenter;
pub mod store;

/// Re-exports of the types most callers need.
pub mod prelude {
    pub use crate::config::DownloadSpec;
    pub use crate::manager::{download, DownloadCoordinator, DownloadError, DownloadOutcome};
    pub use crate::mime::MimeTable;
    pub use crate::models::{DownloadSummary, ResourceMetadata, Segment, SegmentResult};
    pub use crate::progress::{ConsoleProgress, LogProgress, ProgressObserver};
}
