// file: src/query/retriever.rs
// description: embeds questions and fetches ranked chunks from the index

use crate::error::Result;
use crate::index::LanceDbClient;
use crate::llm::EmbeddingProvider;
use crate::models::SearchHit;
use std::sync::Arc;
use tracing::debug;

/// Retrieval half of the query path. Shares the embedding client with the
/// ingest path so questions and chunks always live in the same embedding
/// space.
pub struct Retriever {
    index: Arc<LanceDbClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        index: Arc<LanceDbClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    /// Return up to `top_k` chunks ranked by similarity to `question`.
    /// An empty index yields an empty result, not an error.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>> {
        let embedding = self.embedder.embed(question).await?;
        let hits = self.index.vector_search(embedding, self.top_k).await?;
        debug!("Retrieved {} chunks for question", hits.len());
        Ok(hits)
    }

    /// Same as [`retrieve`](Self::retrieve) with a caller-chosen result
    /// count, used by the search CLI.
    pub async fn retrieve_with_limit(
        &self,
        question: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let embedding = self.embedder.embed(question).await?;
        self.index.vector_search(embedding, limit).await
    }
}
