// file: src/server/state.rs
// description: shared application state wired from configuration

use crate::chunk::TextChunker;
use crate::config::Config;
use crate::crawl::SiteCrawler;
use crate::error::Result;
use crate::index::{ChunkIndexer, LanceDbClient};
use crate::llm::OllamaClient;
use crate::pipeline::IngestPipeline;
use crate::query::{AnswerGenerator, QueryOrchestrator, Retriever};
use crate::store::DocumentStore;
use std::sync::Arc;
use tracing::warn;

/// Everything the handlers share. The embedding client is a single
/// instance reused by both the ingest and query paths, which keeps
/// stored chunks and query vectors in one embedding space.
pub struct AppState {
    pub config: Config,
    pub store: Arc<DocumentStore>,
    pub index: Arc<LanceDbClient>,
    pub llm: Arc<OllamaClient>,
    pub pipeline: IngestPipeline,
    pub orchestrator: QueryOrchestrator,
}

impl AppState {
    /// Wire up the full pipeline. An unreachable LLM backend does not
    /// block startup; /health reports it until it comes back.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = Arc::new(DocumentStore::new(config.storage.clone())?);
        let index = Arc::new(LanceDbClient::new(config.index.clone()).await?);
        let llm = Arc::new(OllamaClient::new(&config.llm)?);

        if !llm.health().await.unwrap_or(false) {
            warn!(
                "LLM backend at {} is not ready, starting degraded",
                config.llm.base_url
            );
        }

        let indexer = Arc::new(ChunkIndexer::new(index.clone(), llm.clone()));
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
        let pipeline = IngestPipeline::new(store.clone(), indexer, chunker);

        let retriever = Retriever::new(index.clone(), llm.clone(), config.query.top_k);
        let generator = AnswerGenerator::new(llm.clone());
        let orchestrator = QueryOrchestrator::new(retriever, generator, config.query.budget_secs);

        Ok(Self {
            config: config.clone(),
            store,
            index,
            llm,
            pipeline,
            orchestrator,
        })
    }

    /// Rebuild the index from whatever the uploads directory already
    /// holds. Called once on server startup; failures are logged inside
    /// and never abort the server.
    pub async fn reindex_existing(&self) {
        match self.pipeline.reindex_store().await {
            Ok(stats) => {
                if stats.files_failed > 0 {
                    warn!(
                        "Startup re-index: {} indexed, {} failed",
                        stats.files_indexed, stats.files_failed
                    );
                }
            }
            Err(e) => warn!("Startup re-index skipped: {}", e),
        }
    }

    /// Crawl the configured website, if any, and ingest its pages. A
    /// failing crawl never aborts the server; the crawl runs again on
    /// the next restart and unchanged pages are skipped.
    pub async fn crawl_configured_site(&self) {
        let Some(url) = self.config.crawler.website_url.clone() else {
            return;
        };

        let crawler = match SiteCrawler::new(&self.config.crawler) {
            Ok(crawler) => crawler,
            Err(e) => {
                warn!("Web crawling skipped: {}", e);
                return;
            }
        };

        if let Err(e) = crawler.crawl_into(&self.pipeline, &url).await {
            warn!("Web crawling skipped due to error: {}", e);
        }
    }
}
