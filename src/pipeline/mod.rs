// file: src/pipeline/mod.rs
// description: ingestion pipeline from document bytes to indexed chunks

pub mod ingest;
pub mod progress;

pub use ingest::{IngestPipeline, IngestReport};
pub use progress::{IngestStats, ProgressTracker};
