// file: src/index/writer.rs
// description: chunk embedding and index write path
// reference: https://docs.rs/lancedb

use crate::error::{PipelineError, Result};
use crate::index::client::LanceDbClient;
use crate::index::schema::chunks_schema;
use crate::llm::EmbeddingProvider;
use crate::models::Chunk;
use arrow_array::{
    FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt32Array,
    UInt64Array,
};
use lance_arrow::FixedSizeListArrayExt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use uuid::Uuid;

/// Write path for the chunk index. Callers serialize mutations per
/// document (the ingest pipeline holds the document lock), so the methods
/// here only have to guarantee that a failed embedding call leaves the
/// index untouched: all embeddings are computed before any delete or
/// insert happens.
pub struct ChunkIndexer {
    client: Arc<LanceDbClient>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl ChunkIndexer {
    pub fn new(client: Arc<LanceDbClient>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { client, embedder }
    }

    /// Replace every entry for `document` with freshly embedded chunks.
    /// Embedding failures propagate before the old entries are dropped.
    pub async fn upsert(&self, document: &str, chunks: &[Chunk]) -> Result<usize> {
        let mut embeddings = Vec::with_capacity(chunks.len());
        let expected_dim = self.client.embedding_dim();

        for chunk in chunks {
            let embedding = self.embedder.embed(&chunk.text).await?;
            if embedding.len() != expected_dim {
                return Err(PipelineError::Embedding(format!(
                    "model {} returned dimension {}, index expects {}",
                    self.embedder.model_name(),
                    embedding.len(),
                    expected_dim
                )));
            }
            embeddings.push(embedding);
        }

        // old entries only disappear once every new embedding exists
        self.client.delete_by_document(document).await?;

        if chunks.is_empty() {
            debug!("Document {} produced no chunks, index left empty", document);
            return Ok(0);
        }

        let schema = chunks_schema(expected_dim);
        let batch = create_record_batch(schema.clone(), chunks, &embeddings)?;
        let table_name = self.client.table_name();

        if !self.client.table_exists(table_name).await? {
            self.client
                .get_connection()
                .create_table(
                    table_name,
                    RecordBatchIterator::new(vec![Ok(batch)], schema),
                )
                .execute()
                .await
                .map_err(|e| PipelineError::Database(format!("Failed to create table: {}", e)))?;
            info!("Created chunk table: {}", table_name);
        } else {
            let table = self.client.get_table(table_name).await?;
            table
                .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
                .execute()
                .await
                .map_err(|e| PipelineError::Database(format!("Failed to insert chunks: {}", e)))?;
        }

        info!("Indexed {} chunks for {}", chunks.len(), document);
        Ok(chunks.len())
    }

    /// Idempotent removal of a document's entries.
    pub async fn remove(&self, document: &str) -> Result<()> {
        self.client.delete_by_document(document).await
    }
}

fn create_record_batch(
    schema: Arc<arrow_schema::Schema>,
    chunks: &[Chunk],
    embeddings: &[Vec<f32>],
) -> Result<RecordBatch> {
    let indexed_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let ids: StringArray = chunks
        .iter()
        .map(|_| Some(Uuid::new_v4().to_string()))
        .collect();

    let documents: StringArray = chunks
        .iter()
        .map(|chunk| Some(chunk.document.clone()))
        .collect();

    let ordinals: UInt32Array = chunks.iter().map(|chunk| Some(chunk.ordinal)).collect();

    let texts: StringArray = chunks
        .iter()
        .map(|chunk| Some(chunk.text.clone()))
        .collect();

    let content_hashes: StringArray = chunks
        .iter()
        .map(|chunk| Some(chunk.content_hash()))
        .collect();

    let indexed_ats: UInt64Array = chunks.iter().map(|_| Some(indexed_at)).collect();

    let embedding_values: Float32Array = embeddings
        .iter()
        .flat_map(|emb| emb.iter().copied())
        .collect();

    let embedding_list =
        FixedSizeListArray::try_new_from_values(embedding_values, embeddings[0].len() as i32)
            .map_err(|e| {
                PipelineError::Database(format!("Failed to create embedding array: {}", e))
            })?;

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(documents),
            Arc::new(ordinals),
            Arc::new(texts),
            Arc::new(content_hashes),
            Arc::new(indexed_ats),
            Arc::new(embedding_list),
        ],
    )
    .map_err(|e| PipelineError::Database(format!("Failed to create record batch: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use async_trait::async_trait;
    use tempfile::TempDir;

    const DIM: usize = 4;

    /// Deterministic stand-in for the embedding backend.
    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; DIM];
            v[0] = text.len() as f32;
            Ok(v)
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    /// Backend that fails every call, as an unreachable server would.
    struct OfflineEmbedder;

    #[async_trait]
    impl EmbeddingProvider for OfflineEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(PipelineError::Embedding("connection refused".to_string()))
        }

        fn model_name(&self) -> &str {
            "offline"
        }
    }

    /// Backend answering with the wrong vector width.
    struct WrongDimEmbedder;

    #[async_trait]
    impl EmbeddingProvider for WrongDimEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; DIM + 1])
        }

        fn model_name(&self) -> &str {
            "wrong-dim"
        }
    }

    async fn test_client(dir: &TempDir) -> Arc<LanceDbClient> {
        let config = IndexConfig {
            uri: dir.path().join("lancedb").to_string_lossy().to_string(),
            table_name: "chunks".to_string(),
            embedding_dim: DIM,
        };
        Arc::new(LanceDbClient::new(config).await.unwrap())
    }

    fn chunks(document: &str, texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(document.to_string(), i as u32, t.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_upsert_replaces_previous_entries() {
        let dir = TempDir::new().unwrap();
        let client = test_client(&dir).await;
        let indexer = ChunkIndexer::new(client.clone(), Arc::new(FixedEmbedder));

        let first = chunks("menu.pdf", &["starters", "mains", "desserts"]);
        assert_eq!(indexer.upsert("menu.pdf", &first).await.unwrap(), 3);
        assert_eq!(client.entry_count().await.unwrap(), 3);

        // re-upload with fewer chunks: old rows must not linger
        let second = chunks("menu.pdf", &["new menu"]);
        assert_eq!(indexer.upsert("menu.pdf", &second).await.unwrap(), 1);
        assert_eq!(client.entry_count().await.unwrap(), 1);

        let hits = client.vector_search(vec![0.0; DIM], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "new menu");
    }

    #[tokio::test]
    async fn test_upsert_leaves_other_documents_alone() {
        let dir = TempDir::new().unwrap();
        let client = test_client(&dir).await;
        let indexer = ChunkIndexer::new(client.clone(), Arc::new(FixedEmbedder));

        indexer
            .upsert("menu.pdf", &chunks("menu.pdf", &["menu text"]))
            .await
            .unwrap();
        indexer
            .upsert("hours.txt", &chunks("hours.txt", &["open at noon"]))
            .await
            .unwrap();
        assert_eq!(client.entry_count().await.unwrap(), 2);

        indexer.remove("menu.pdf").await.unwrap();
        let hits = client.vector_search(vec![0.0; DIM], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document, "hours.txt");
    }

    #[tokio::test]
    async fn test_failed_embedding_keeps_existing_entries() {
        let dir = TempDir::new().unwrap();
        let client = test_client(&dir).await;

        let indexer = ChunkIndexer::new(client.clone(), Arc::new(FixedEmbedder));
        let original = chunks("menu.pdf", &["starters", "mains"]);
        indexer.upsert("menu.pdf", &original).await.unwrap();

        let offline = ChunkIndexer::new(client.clone(), Arc::new(OfflineEmbedder));
        let result = offline
            .upsert("menu.pdf", &chunks("menu.pdf", &["replacement"]))
            .await;

        assert!(matches!(result, Err(PipelineError::Embedding(_))));
        // failed call must not have touched the previous rows
        assert_eq!(client.entry_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_keeps_existing_entries() {
        let dir = TempDir::new().unwrap();
        let client = test_client(&dir).await;

        let indexer = ChunkIndexer::new(client.clone(), Arc::new(FixedEmbedder));
        indexer
            .upsert("menu.pdf", &chunks("menu.pdf", &["starters"]))
            .await
            .unwrap();

        let mismatched = ChunkIndexer::new(client.clone(), Arc::new(WrongDimEmbedder));
        let result = mismatched
            .upsert("menu.pdf", &chunks("menu.pdf", &["replacement"]))
            .await;

        assert!(matches!(result, Err(PipelineError::Embedding(_))));
        assert_eq!(client.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_empty_chunks_clears_document() {
        let dir = TempDir::new().unwrap();
        let client = test_client(&dir).await;
        let indexer = ChunkIndexer::new(client.clone(), Arc::new(FixedEmbedder));

        indexer
            .upsert("menu.pdf", &chunks("menu.pdf", &["starters"]))
            .await
            .unwrap();
        assert_eq!(indexer.upsert("menu.pdf", &[]).await.unwrap(), 0);
        assert_eq!(client.entry_count().await.unwrap(), 0);
    }

    #[test]
    fn test_record_batch_shape() {
        let chunks = vec![
            Chunk::new("menu.pdf".to_string(), 0, "Tuesday special".to_string()),
            Chunk::new("menu.pdf".to_string(), 1, "Wednesday soup".to_string()),
        ];
        let embeddings = vec![vec![0.1f32; 4], vec![0.2f32; 4]];

        let schema = chunks_schema(4);
        let batch = create_record_batch(schema, &chunks, &embeddings).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 7);
    }

    #[test]
    fn test_record_batch_ordinals_preserved() {
        let chunks = vec![
            Chunk::new("a.txt".to_string(), 0, "first".to_string()),
            Chunk::new("a.txt".to_string(), 1, "second".to_string()),
            Chunk::new("a.txt".to_string(), 2, "third".to_string()),
        ];
        let embeddings = vec![vec![0.0f32; 2]; 3];

        let batch = create_record_batch(chunks_schema(2), &chunks, &embeddings).unwrap();
        let ordinals = batch
            .column_by_name("ordinal")
            .unwrap()
            .as_any()
            .downcast_ref::<UInt32Array>()
            .unwrap();

        assert_eq!(ordinals.values(), &[0, 1, 2]);
    }
}
