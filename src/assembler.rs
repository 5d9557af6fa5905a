// src/assembler.rs

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::mime;
use crate::models::SegmentResult;
use crate::store::{ResultsStore, StoreError};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invariant violated: {0}")]
    Invariant(#[from] StoreError),
}

/// `<epoch-millis><0-99>.<extension>`
pub fn output_file_name(extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u8 = rand::random_range(0..100);
    format!("{}{}.{}", millis, suffix, extension)
}

/// Writes every segment of the store, in index order, to a fresh file in
/// `destination` (the current directory when `None`) and returns its path
/// and size. The extension comes from the process-wide MIME table.
///
/// The file is created exclusively. If any write fails the partial file is
/// removed before the error is returned.
pub async fn assemble(
    store: &ResultsStore,
    segment_count: usize,
    content_type: &str,
    destination: Option<&Path>,
) -> Result<(PathBuf, u64), AssembleError> {
    let ordered = store.take_ordered(segment_count)?;

    let dir = destination.unwrap_or_else(|| Path::new("."));
    let path = dir.join(output_file_name(mime::global().extension_for(content_type)));

    match write_segments(&path, &ordered).await {
        Ok(written) => {
            debug!(path = %path.display(), bytes = written, segments = segment_count, "assembled output file");
            Ok((path, written))
        }
        Err(source) => {
            // AlreadyExists means the file belongs to someone else.
            if source.kind() != std::io::ErrorKind::AlreadyExists {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %path.display(), error = %e, "failed to remove partial output");
                    }
                }
            }
            Err(AssembleError::Write { path, source })
        }
    }
}

async fn write_segments(path: &Path, ordered: &[SegmentResult]) -> std::io::Result<u64> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let mut writer = BufWriter::new(file);

    let mut written = 0u64;
    for result in ordered {
        let bytes = result.bytes();
        writer.write_all(bytes).await?;
        written += bytes.len() as u64;
    }
    writer.flush().await?;
    writer.into_inner().sync_all().await?;
    Ok(written)
}
