// file: src/llm/mod.rs
// description: language-model backend client and the embedding seam

mod ollama;

pub use ollama::OllamaClient;

use crate::error::Result;
use async_trait::async_trait;

/// Seam over the embedding backend. The indexer and retriever depend on
/// this trait rather than the concrete client, so tests can substitute a
/// deterministic embedder.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identity, for error messages and logs.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        OllamaClient::embed(self, text).await
    }

    fn model_name(&self) -> &str {
        self.embed_model()
    }
}
