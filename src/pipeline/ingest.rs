// file: src/pipeline/ingest.rs
// description: store, extract, chunk and index documents under per-document locks

use crate::chunk::TextChunker;
use crate::error::Result;
use crate::extract::Extractor;
use crate::index::ChunkIndexer;
use crate::models::{Chunk, DocumentFormat};
use crate::pipeline::progress::{IngestStats, ProgressTracker};
use crate::store::{DocLocks, DocumentStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Outcome of ingesting a single document.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub filename: String,
    pub chunks_indexed: usize,
}

/// End-to-end ingestion: persist bytes, extract text, chunk, embed and
/// index. All mutations for one document run under that document's lock,
/// so a concurrent upload and delete of the same filename serialize
/// instead of interleaving.
pub struct IngestPipeline {
    store: Arc<DocumentStore>,
    indexer: Arc<ChunkIndexer>,
    chunker: TextChunker,
    locks: DocLocks,
}

impl IngestPipeline {
    pub fn new(store: Arc<DocumentStore>, indexer: Arc<ChunkIndexer>, chunker: TextChunker) -> Self {
        Self {
            store,
            indexer,
            chunker,
            locks: DocLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Ingest one uploaded document. Re-uploading a filename replaces both
    /// its stored bytes and its index entries.
    pub async fn ingest_bytes(&self, filename: &str, bytes: &[u8]) -> Result<IngestReport> {
        let lock = self.locks.for_document(filename);
        let _guard = lock.lock().await;

        let meta = self.store.put(filename, bytes).await?;

        // If the replacement bytes are unreadable, entries from the previous
        // version must not stay searchable: the stored document and its
        // chunks would describe different content.
        let chunks = match self.extract_and_chunk(filename, meta.format, bytes) {
            Ok(chunks) => chunks,
            Err(e) => {
                if let Err(cleanup) = self.indexer.remove(filename).await {
                    warn!("Failed to drop stale entries for {}: {}", filename, cleanup);
                }
                return Err(e);
            }
        };

        let chunks_indexed = self.indexer.upsert(filename, &chunks).await?;

        info!("Ingested {} ({} chunks)", filename, chunks_indexed);
        Ok(IngestReport {
            filename: filename.to_string(),
            chunks_indexed,
        })
    }

    /// Delete a document and its index entries. Index entries go first:
    /// if the file delete then fails, a retry sees the file and can
    /// finish the job, whereas the reverse order could leave orphaned
    /// chunks pointing at a missing file.
    pub async fn delete_document(&self, filename: &str) -> Result<()> {
        let lock = self.locks.for_document(filename);
        let _guard = lock.lock().await;

        if !self.store.exists(filename).await {
            return Err(crate::error::PipelineError::NotFound(filename.to_string()));
        }

        self.indexer.remove(filename).await?;
        self.store.delete(filename).await?;

        drop(_guard);
        drop(lock);
        self.locks.release(filename);

        info!("Deleted document: {}", filename);
        Ok(())
    }

    /// Re-index a document already present in the store.
    pub async fn reindex(&self, filename: &str) -> Result<IngestReport> {
        let lock = self.locks.for_document(filename);
        let _guard = lock.lock().await;

        let bytes = self.store.read(filename).await?;
        let format = DocumentFormat::from_filename(filename)?;
        let chunks = self.extract_and_chunk(filename, format, &bytes)?;
        let chunks_indexed = self.indexer.upsert(filename, &chunks).await?;

        Ok(IngestReport {
            filename: filename.to_string(),
            chunks_indexed,
        })
    }

    /// Re-index every supported file already sitting in the uploads
    /// directory. Individual failures are logged and skipped so one bad
    /// file cannot block startup.
    pub async fn reindex_store(&self) -> Result<IngestStats> {
        let documents = self.store.list().await?;
        info!("Re-indexing {} stored documents", documents.len());

        let mut stats = IngestStats::new();
        for meta in documents {
            match self.reindex(&meta.filename).await {
                Ok(report) => {
                    stats.files_indexed += 1;
                    stats.chunks_created += report.chunks_indexed;
                    stats.total_bytes_processed += meta.size_bytes;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", meta.filename, e);
                    stats.files_failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Bulk-ingest every supported file under `dir`, with a progress bar.
    /// Used by the ingest CLI command.
    pub async fn ingest_dir(&self, dir: &Path, colored: bool) -> Result<IngestStats> {
        let files: Vec<_> = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| DocumentFormat::from_filename(name).is_ok())
            })
            .collect();

        info!("Found {} supported files under {}", files.len(), dir.display());
        let tracker = ProgressTracker::with_color(files.len(), colored);

        for entry in files {
            let filename = entry.file_name().to_string_lossy().to_string();
            tracker.set_message(format!("Indexing {}", filename));

            let result = async {
                let bytes = tokio::fs::read(entry.path()).await?;
                let report = self.ingest_bytes(&filename, &bytes).await?;
                Ok::<_, crate::error::PipelineError>((bytes.len() as u64, report))
            }
            .await;

            match result {
                Ok((bytes_len, report)) => {
                    tracker.inc_files_indexed();
                    tracker.add_chunks(report.chunks_indexed);
                    tracker.add_bytes_processed(bytes_len);
                }
                Err(e) => {
                    warn!("Failed to ingest {}: {}", filename, e);
                    tracker.inc_files_failed();
                }
            }
        }

        tracker.finish();
        Ok(tracker.get_stats())
    }

    fn extract_and_chunk(
        &self,
        filename: &str,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> Result<Vec<Chunk>> {
        let text = Extractor::extract(filename, format, bytes)?;
        let chunks = self
            .chunker
            .split(&text)
            .into_iter()
            .enumerate()
            .map(|(ordinal, piece)| Chunk::new(filename.to_string(), ordinal as u32, piece))
            .collect();
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::TextChunker;
    use crate::config::{IndexConfig, StorageConfig};
    use crate::error::{PipelineError, Result};
    use crate::index::LanceDbClient;
    use crate::llm::EmbeddingProvider;
    use async_trait::async_trait;
    use tempfile::TempDir;

    const DIM: usize = 4;

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

    async fn test_pipeline(dir: &TempDir) -> (IngestPipeline, Arc<LanceDbClient>) {
        let storage = StorageConfig {
            uploads_dir: dir.path().join("uploads"),
            max_file_size_mb: 1,
            allowed_extensions: vec![
                "pdf".to_string(),
                "docx".to_string(),
                "txt".to_string(),
                "md".to_string(),
            ],
        };
        let index_config = IndexConfig {
            uri: dir.path().join("lancedb").to_string_lossy().to_string(),
            table_name: "chunks".to_string(),
            embedding_dim: DIM,
        };

        let store = Arc::new(DocumentStore::new(storage).unwrap());
        let client = Arc::new(LanceDbClient::new(index_config).await.unwrap());
        let indexer = Arc::new(ChunkIndexer::new(client.clone(), Arc::new(FixedEmbedder)));
        let chunker = TextChunker::new(100, 20);

        (IngestPipeline::new(store, indexer, chunker), client)
    }

    #[tokio::test]
    async fn test_ingest_stores_and_indexes() {
        let dir = TempDir::new().unwrap();
        let (pipeline, client) = test_pipeline(&dir).await;

        let report = pipeline
            .ingest_bytes("hours.txt", b"Open Tuesday through Sunday, noon to ten.")
            .await
            .unwrap();

        assert_eq!(report.chunks_indexed, 1);
        assert!(pipeline.store().exists("hours.txt").await);
        assert_eq!(client.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_extraction_drops_stale_entries() {
        let dir = TempDir::new().unwrap();
        let (pipeline, client) = test_pipeline(&dir).await;

        // a previously indexed version of the document
        pipeline.store().put("menu.pdf", b"%PDF-old").await.unwrap();
        let old_chunks = vec![
            Chunk::new("menu.pdf".to_string(), 0, "old starters".to_string()),
            Chunk::new("menu.pdf".to_string(), 1, "old mains".to_string()),
        ];
        pipeline
            .indexer
            .upsert("menu.pdf", &old_chunks)
            .await
            .unwrap();
        assert_eq!(client.entry_count().await.unwrap(), 2);

        // replacement bytes that cannot be extracted
        let result = pipeline.ingest_bytes("menu.pdf", b"not a pdf at all").await;
        assert!(matches!(result, Err(PipelineError::Extraction { .. })));

        // the old version's chunks must not stay retrievable
        assert_eq!(client.entry_count().await.unwrap(), 0);
        // the new bytes are stored but un-indexed, retryable via re-upload
        assert_eq!(
            pipeline.store().read("menu.pdf").await.unwrap(),
            b"not a pdf at all"
        );
    }

    #[tokio::test]
    async fn test_delete_drops_index_and_bytes() {
        let dir = TempDir::new().unwrap();
        let (pipeline, client) = test_pipeline(&dir).await;

        pipeline
            .ingest_bytes("hours.txt", b"Open at noon.")
            .await
            .unwrap();
        pipeline.delete_document("hours.txt").await.unwrap();

        assert!(!pipeline.store().exists("hours.txt").await);
        assert_eq!(client.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_reports_plain_filename() {
        let dir = TempDir::new().unwrap();
        let (pipeline, _client) = test_pipeline(&dir).await;

        let err = pipeline.delete_document("missing.txt").await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
        assert_eq!(err.to_string(), "Document not found: missing.txt");
    }

    #[test]
    fn test_chunk_ordinals_follow_text_order() {
        let chunker = TextChunker::new(40, 10);
        let text = "First sentence here. Second sentence follows. Third one closes it out.";

        let pieces = chunker.split(text);
        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(i, piece)| Chunk::new("menu.txt".to_string(), i as u32, piece))
            .collect();

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i as u32);
            assert_eq!(chunk.document, "menu.txt");
        }
    }
}
