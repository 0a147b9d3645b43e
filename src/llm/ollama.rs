// file: src/llm/ollama.rs
// description: Ollama API integration for embeddings and answer generation
// reference: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::config::LlmConfig;
use crate::error::{PipelineError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Long-lived handle to the local Ollama server. One instance is created
/// at startup and shared by the indexer and the retriever, which is what
/// keeps index-side and query-side embeddings in the same vector space.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    embed_model: String,
    generate_model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embed_model: config.embed_model.clone(),
            generate_model: config.generate_model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    pub fn generate_model(&self) -> &str {
        &self.generate_model
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.embed_model,
            prompt: text,
        };

        debug!("Requesting embedding for {} chars", text.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Embedding(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Embedding(format!("invalid response: {}", e)))?;

        if parsed.embedding.is_empty() {
            return Err(PipelineError::Embedding(
                "backend returned an empty embedding".to_string(),
            ));
        }

        Ok(parsed.embedding)
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.generate_model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        debug!("Sending generation request ({} prompt chars)", prompt.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Generation(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Generation(format!("invalid response: {}", e)))?;

        Ok(parsed.response.trim().to_string())
    }

    /// Backend reachability check: the tags endpoint must answer and both
    /// configured models must be installed.
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PipelineError::Generation(format!("backend unreachable: {}", e)))?;

        if !response.status().is_success() {
            warn!("Ollama tags endpoint returned {}", response.status());
            return Ok(false);
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Generation(format!("invalid tags response: {}", e)))?;

        let has_model = |wanted: &str| {
            tags.models
                .iter()
                .any(|m| m.name == wanted || m.name.starts_with(wanted))
        };

        let ready = has_model(&self.generate_model) && has_model(&self.embed_model);
        if !ready {
            warn!(
                "Models {} / {} not all installed ({} models present)",
                self.generate_model,
                self.embed_model,
                tags.models.len()
            );
        }

        Ok(ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:11434/".to_string(),
            generate_model: "deepseek-llm:7b".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            temperature: 0.7,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = OllamaClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_models_exposed() {
        let client = OllamaClient::new(&test_config()).unwrap();
        assert_eq!(client.embed_model(), "nomic-embed-text");
        assert_eq!(client.generate_model(), "deepseek-llm:7b");
    }

    #[test]
    fn test_generate_request_serialization() {
        let request = GenerateRequest {
            model: "deepseek-llm:7b",
            prompt: "ping",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.5);
    }
}
