// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub chunking: ChunkingConfig,
    pub llm: LlmConfig,
    pub query: QueryConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
    pub max_file_size_mb: usize,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    pub uri: String,
    pub table_name: String,
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub generate_model: String,
    pub embed_model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    pub top_k: usize,
    pub budget_secs: u64,
}

/// Optional website bootstrap: when `website_url` is set, the server
/// crawls it at startup and feeds the pages through the ingest pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub website_url: Option<String>,
    pub max_pages: usize,
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            website_url: None,
            max_pages: 10,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RESTO_QA")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            storage: StorageConfig {
                uploads_dir: PathBuf::from("./data"),
                max_file_size_mb: 10,
                allowed_extensions: vec![
                    "pdf".to_string(),
                    "docx".to_string(),
                    "txt".to_string(),
                    "md".to_string(),
                ],
            },
            index: IndexConfig {
                uri: "data/lancedb".to_string(),
                table_name: "chunks".to_string(),
                embedding_dim: 768,
            },
            chunking: ChunkingConfig {
                chunk_size: 1000,
                chunk_overlap: 150,
            },
            llm: LlmConfig {
                base_url: "http://localhost:11434".to_string(),
                generate_model: "deepseek-llm:7b".to_string(),
                embed_model: "nomic-embed-text".to_string(),
                temperature: 0.7,
                request_timeout_secs: 30,
            },
            query: QueryConfig {
                top_k: 3,
                budget_secs: 45,
            },
            crawler: CrawlerConfig::default(),
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        (self.storage.max_file_size_mb as u64) * 1_048_576
    }

    fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(PipelineError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(PipelineError::Config(
                "chunk_overlap must be smaller than chunk_size".to_string(),
            ));
        }

        if self.query.top_k == 0 {
            return Err(PipelineError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }

        if self.index.embedding_dim == 0 {
            return Err(PipelineError::Config(
                "embedding_dim must be greater than 0".to_string(),
            ));
        }

        if self.storage.allowed_extensions.is_empty() {
            return Err(PipelineError::Config(
                "allowed_extensions must not be empty".to_string(),
            ));
        }

        if self.crawler.website_url.is_some() && self.crawler.max_pages == 0 {
            return Err(PipelineError::Config(
                "crawler.max_pages must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 150);
        assert_eq!(config.query.top_k, 3);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default_config();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_file_size_bytes() {
        let config = Config::default_config();
        assert_eq!(config.max_file_size_bytes(), 10 * 1_048_576);
    }

    #[test]
    fn test_crawler_defaults_off() {
        let config = Config::default_config();
        assert!(config.crawler.website_url.is_none());
        assert_eq!(config.crawler.max_pages, 10);

        let mut config = config;
        config.crawler.website_url = Some("https://example.com".to_string());
        config.crawler.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_extension_list_rejected() {
        let mut config = Config::default_config();
        config.storage.allowed_extensions.clear();
        assert!(config.validate().is_err());
    }
}
