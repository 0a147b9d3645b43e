// file: src/index/client.rs
// description: LanceDB client wrapper with connection management
// reference: https://docs.rs/lancedb

use crate::config::IndexConfig;
use crate::error::{PipelineError, Result};
use crate::models::SearchHit;
use arrow_array::{Float32Array, StringArray, UInt32Array};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, Table};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct LanceDbClient {
    connection: Connection,
    config: IndexConfig,
}

impl LanceDbClient {
    pub async fn new(config: IndexConfig) -> Result<Self> {
        info!("Connecting to LanceDB at {}", config.uri);

        let connection = connect(&config.uri)
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self { connection, config })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        match self.connection.table_names().execute().await {
            Ok(_) => Ok(true),
            Err(e) => Err(PipelineError::Database(format!(
                "LanceDB connection failed: {}",
                e
            ))),
        }
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == table_name))
    }

    pub async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                PipelineError::Database(format!("Failed to open table {}: {}", table_name, e))
            })
    }

    pub async fn entry_count(&self) -> Result<u64> {
        if !self.table_exists(&self.config.table_name).await? {
            return Ok(0);
        }

        let table = self.get_table(&self.config.table_name).await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| PipelineError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Delete every entry belonging to one document. A no-op when the
    /// table does not exist yet; deletion is idempotent.
    pub async fn delete_by_document(&self, document: &str) -> Result<()> {
        if !self.table_exists(&self.config.table_name).await? {
            debug!("Table does not exist, nothing to delete");
            return Ok(());
        }

        let table = self.get_table(&self.config.table_name).await?;
        let predicate = format!("document = '{}'", escape_predicate_value(document));

        debug!("Deleting entries with predicate: {}", predicate);

        table.delete(&predicate).await.map_err(|e| {
            PipelineError::Database(format!(
                "Failed to delete entries for document {}: {}",
                document, e
            ))
        })?;

        info!("Dropped index entries for document: {}", document);
        Ok(())
    }

    /// Nearest-neighbor search over chunk embeddings. Results come back
    /// ranked by distance with a deterministic tie-break on document
    /// identity and ordinal. An absent table yields no results.
    pub async fn vector_search(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        if !self.table_exists(&self.config.table_name).await? {
            warn!("Chunk table does not exist, returning empty results");
            return Ok(Vec::new());
        }

        let table = self.get_table(&self.config.table_name).await?;

        debug!("Performing vector search with limit {}", limit);

        let query = table
            .vector_search(query_embedding)
            .map_err(|e| PipelineError::Database(format!("Failed to create vector search: {}", e)))?
            .limit(limit);

        let mut results_stream = query
            .execute()
            .await
            .map_err(|e| PipelineError::Database(format!("Vector search failed: {}", e)))?;

        let mut hits = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result.map_err(|e| {
                PipelineError::Database(format!("Failed to read result batch: {}", e))
            })?;

            let documents = string_column(&batch, "document")?;
            let ordinals = batch
                .column_by_name("ordinal")
                .ok_or_else(|| PipelineError::Database("Missing 'ordinal' column".to_string()))?
                .as_any()
                .downcast_ref::<UInt32Array>()
                .ok_or_else(|| {
                    PipelineError::Database("Invalid 'ordinal' column type".to_string())
                })?;
            let texts = string_column(&batch, "text")?;

            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>().cloned());

            for i in 0..batch.num_rows() {
                let (score, distance) = if let Some(ref dist_array) = distances {
                    let dist = dist_array.value(i);
                    // lower distance = higher similarity
                    (1.0 / (1.0 + dist), Some(dist))
                } else {
                    (1.0, None)
                };

                hits.push(SearchHit::new(
                    documents.value(i).to_string(),
                    ordinals.value(i),
                    texts.value(i).to_string(),
                    score,
                    distance,
                ));
            }
        }

        hits.sort_by(|a, b| {
            let da = a.distance.unwrap_or(f32::MAX);
            let db = b.distance.unwrap_or(f32::MAX);
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.cmp(&b.document))
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        });
        hits.truncate(limit);

        debug!("Vector search returned {} results", hits.len());
        Ok(hits)
    }
}

fn string_column<'a>(
    batch: &'a arrow_array::RecordBatch,
    name: &str,
) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PipelineError::Database(format!("Invalid '{}' column type", name)))
}

/// Single quotes in filenames would otherwise break the SQL-ish predicate.
fn escape_predicate_value(value: &str) -> String {
    value.replace('\'', "''")
}
