// src/progress.rs

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Receives a notification every time a segment is stored successfully.
/// Failed or cancelled segments are not reported.
///
/// Observers are purely informational and cannot influence the download.
pub trait ProgressObserver: Send + Sync {
    fn on_segment_complete(&self, completed: usize, total: usize);

    /// Called once after the last segment, before assembly.
    fn on_finish(&self) {}
}

/// Fraction of segments completed, in `0.0..=1.0`.
pub fn fraction(completed: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        completed as f64 / total as f64
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_segment_complete(&self, _completed: usize, _total: usize) {}
}

/// Emits progress as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_segment_complete(&self, completed: usize, total: usize) {
        debug!(completed, total, percent = fraction(completed, total) * 100.0, "segment complete");
    }
}

/// Terminal progress bar counting segments.
pub struct ConsoleProgress {
    pb: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos}/{len} segments ({percent}%)") {
            pb.set_style(style.progress_chars("#>-"));
        }
        Self { pb }
    }

    pub fn hidden() -> Self {
        Self { pb: ProgressBar::hidden() }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_segment_complete(&self, completed: usize, total: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_position(completed as u64);
    }

    fn on_finish(&self) {
        self.pb.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        assert_eq!(fraction(0, 4), 0.0);
        assert_eq!(fraction(1, 4), 0.25);
        assert_eq!(fraction(4, 4), 1.0);
        assert_eq!(fraction(0, 0), 1.0);
    }
}
