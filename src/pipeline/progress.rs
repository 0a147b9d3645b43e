// file: src/pipeline/progress.rs
// description: progress reporting and counters for bulk ingestion
// reference: https://docs.rs/indicatif

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Counters accumulated over one bulk-ingest run.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub files_indexed: usize,
    pub files_failed: usize,
    pub chunks_created: usize,
    pub total_bytes_processed: u64,
    pub duration_secs: u64,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.files_indexed + self.files_failed;
        if total == 0 {
            return 0.0;
        }
        (self.files_indexed as f64 / total as f64) * 100.0
    }
}

/// One progress bar over the files of a bulk ingest, with the per-file
/// outcome folded into atomic counters read back as [`IngestStats`].
pub struct ProgressTracker {
    bar: ProgressBar,
    files_indexed: AtomicUsize,
    files_failed: AtomicUsize,
    chunks_created: AtomicUsize,
    bytes_processed: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn with_color(total_files: usize, colored: bool) -> Self {
        let bar = ProgressBar::new(total_files as u64);
        let template = if colored {
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
        } else {
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template(template)
                .expect("Failed to create progress bar template")
                .progress_chars(if colored { "█▓▒░" } else { "=>-" }),
        );

        Self {
            bar,
            files_indexed: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            chunks_created: AtomicUsize::new(0),
            bytes_processed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn inc_files_indexed(&self) {
        self.files_indexed.fetch_add(1, Ordering::SeqCst);
        self.bar.inc(1);
    }

    pub fn inc_files_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
        self.bar.inc(1);
    }

    pub fn add_chunks(&self, count: usize) {
        self.chunks_created.fetch_add(count, Ordering::SeqCst);
    }

    pub fn add_bytes_processed(&self, bytes: u64) {
        self.bytes_processed.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn set_message(&self, message: String) {
        self.bar.set_message(message);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Indexing complete");
    }

    pub fn get_stats(&self) -> IngestStats {
        IngestStats {
            files_indexed: self.files_indexed.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            chunks_created: self.chunks_created.load(Ordering::SeqCst),
            total_bytes_processed: self.bytes_processed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }
}
