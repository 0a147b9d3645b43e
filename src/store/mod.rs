// file: src/store/mod.rs
// description: durable storage for uploaded document bytes
// reference: local filesystem persistence

use crate::config::StorageConfig;
use crate::error::{PipelineError, Result};
use crate::models::{DocumentFormat, DocumentMeta};
use crate::utils::Validator;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

/// Per-document async mutexes. Writers (upload/delete) take the lock for
/// the document they mutate so that a concurrent upload-then-delete of the
/// same filename cannot interleave; documents are independent, so there is
/// no global lock.
#[derive(Default)]
pub struct DocLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DocLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_document(&self, filename: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(filename.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Drop the map entry for a document nobody is locking anymore, so the
    /// map does not grow one entry per filename ever seen. A strong count
    /// above one means another task still holds the mutex handle; the
    /// entry is kept and they race for the same lock as before.
    pub fn release(&self, filename: &str) -> bool {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if map
            .get(filename)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            map.remove(filename);
            return true;
        }
        false
    }
}

/// Filesystem-backed store for raw uploads. Identity is the filename;
/// re-uploading under the same name overwrites the previous bytes.
pub struct DocumentStore {
    uploads_dir: PathBuf,
    config: StorageConfig,
}

impl DocumentStore {
    pub fn new(config: StorageConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.uploads_dir)?;
        Ok(Self {
            uploads_dir: config.uploads_dir.clone(),
            config,
        })
    }

    pub fn uploads_dir(&self) -> &PathBuf {
        &self.uploads_dir
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        self.uploads_dir.join(filename)
    }

    /// Validate and persist an upload. Overwrites on name collision.
    pub async fn put(&self, filename: &str, bytes: &[u8]) -> Result<DocumentMeta> {
        Validator::validate_filename(filename)?;
        Validator::validate_extension(filename, &self.config.allowed_extensions)?;
        Validator::validate_size(
            filename,
            bytes.len() as u64,
            (self.config.max_file_size_mb as u64) * 1_048_576,
        )?;

        let format = DocumentFormat::from_filename(filename)?;

        let path = self.path_for(filename);
        tokio::fs::write(&path, bytes).await?;

        info!("Stored {} ({} bytes)", filename, bytes.len());
        Ok(DocumentMeta::new(
            filename.to_string(),
            format,
            bytes.len() as u64,
        ))
    }

    /// Metadata for every stored document, ordered by filename. Entries
    /// without a supported extension (stray files) are skipped.
    pub async fn list(&self) -> Result<Vec<DocumentMeta>> {
        let mut documents = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.uploads_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().to_string();
            let format = match DocumentFormat::from_filename(&filename) {
                Ok(format) => format,
                Err(_) => {
                    debug!("Skipping unsupported file in uploads dir: {}", filename);
                    continue;
                }
            };

            let last_modified = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);

            documents.push(DocumentMeta {
                filename,
                format,
                size_bytes: metadata.len(),
                last_modified,
            });
        }

        documents.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(documents)
    }

    pub async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        Validator::validate_filename(filename)?;
        let path = self.path_for(filename);

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PipelineError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, filename: &str) -> bool {
        Validator::validate_filename(filename).is_ok()
            && tokio::fs::try_exists(self.path_for(filename))
                .await
                .unwrap_or(false)
    }

    /// Remove the raw bytes. The caller is responsible for dropping the
    /// document's index entries first; the pipeline enforces that ordering.
    pub async fn delete(&self, filename: &str) -> Result<()> {
        Validator::validate_filename(filename)?;
        let path = self.path_for(filename);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PipelineError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
