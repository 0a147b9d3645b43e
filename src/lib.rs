// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod chunk;
pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod index;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod server;
pub mod store;
pub mod utils;

pub use chunk::TextChunker;
pub use config::{
    ChunkingConfig, Config, CrawlerConfig, IndexConfig, LlmConfig, QueryConfig, StorageConfig,
};
pub use crawl::SiteCrawler;
pub use error::{PipelineError, Result};
pub use extract::Extractor;
pub use index::{ChunkIndexer, LanceDbClient};
pub use llm::{EmbeddingProvider, OllamaClient};
pub use models::{Chunk, DocumentFormat, DocumentMeta, SearchHit};
pub use pipeline::{IngestPipeline, IngestStats, ProgressTracker};
pub use query::{AnswerGenerator, QueryOrchestrator, Retriever};
pub use server::AppState;
pub use store::{DocLocks, DocumentStore};
pub use utils::Validator;
