// file: src/server/routes.rs
// description: HTTP handlers for the document QA endpoints

use crate::error::{PipelineError, Result};
use crate::server::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub customer_data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
}

/// POST /upload — accepts one or more files as multipart form data and
/// runs each through the full ingest pipeline.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut files_uploaded = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::Validation(format!("Invalid multipart payload: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            debug!("Skipping multipart field without a filename");
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| PipelineError::Validation(format!("Failed to read upload: {}", e)))?;

        let report = state.pipeline.ingest_bytes(&filename, &bytes).await?;
        files_uploaded.push(report.filename);
    }

    if files_uploaded.is_empty() {
        return Err(PipelineError::Validation(
            "No files found in upload".to_string(),
        ));
    }

    info!("Uploaded {} file(s)", files_uploaded.len());
    Ok(Json(json!({ "files_uploaded": files_uploaded })))
}

/// GET /documents — stored documents sorted by filename.
pub async fn list_documents(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let documents: Vec<Value> = state
        .store
        .list()
        .await?
        .iter()
        .map(|meta| {
            json!({
                "filename": meta.filename,
                "size_kb": meta.size_kb(),
                "last_modified": meta.last_modified_display(),
            })
        })
        .collect();

    Ok(Json(json!({ "documents": documents })))
}

/// DELETE /documents — removes a document and its index entries.
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Value>> {
    state.pipeline.delete_document(&request.filename).await?;
    Ok(Json(json!({
        "message": format!("Deleted {}", request.filename)
    })))
}

/// POST /query — answers a question from the indexed documents.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let outcome = state
        .orchestrator
        .run(&request.question, request.customer_data.as_deref())
        .await?;

    Ok(Json(QueryResponse {
        answer: outcome.answer,
        sources: outcome.sources,
    }))
}

/// GET /stats — document and index entry counts.
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let total_documents = state.store.list().await?.len();
    let vectorstore_size = state.index.entry_count().await?;

    Ok(Json(json!({
        "total_documents": total_documents,
        "vectorstore_size": vectorstore_size,
    })))
}

/// GET /health — reflects reachability of the LLM backend and presence
/// of the configured models.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    match state.llm.health().await {
        Ok(true) => Json(json!({ "status": "healthy" })),
        Ok(false) => Json(json!({
            "status": "unhealthy",
            "detail": format!(
                "Models {} / {} not available at {}",
                state.config.llm.generate_model,
                state.config.llm.embed_model,
                state.config.llm.base_url
            ),
        })),
        Err(e) => Json(json!({
            "status": "unhealthy",
            "detail": e.to_string(),
        })),
    }
}
