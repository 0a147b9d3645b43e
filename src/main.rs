// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use resto_qa::utils::logging;
use resto_qa::{
    ChunkIndexer, Config, DocumentStore, IngestPipeline, LanceDbClient, OllamaClient, Retriever,
    SiteCrawler, TextChunker, Validator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "resto_qa")]
#[command(version = "0.1.0")]
#[command(about = "Document QA service for restaurant knowledge bases", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Bulk-ingest every supported document under a directory
    Ingest {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Search the index for chunks similar to a question
    Search {
        question: String,

        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,
    },

    /// Crawl a website and ingest its pages as text documents
    Crawl {
        /// Base URL; defaults to the configured crawler.website_url
        url: Option<String>,

        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Show document and index entry counts
    Stats,

    /// Check that the LLM backend is reachable and models are installed
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    resto_qa::utils::logging::init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Serve => {
            info!("Starting document QA server");
            resto_qa::server::serve(config)
                .await
                .context("Server failed")?;
        }
        Commands::Ingest { dir } => {
            cmd_ingest(&config, &dir, cli.color).await?;
        }
        Commands::Search { question, top_k } => {
            cmd_search(&config, &question, top_k).await?;
        }
        Commands::Crawl { url, max_pages } => {
            cmd_crawl(&config, url, max_pages).await?;
        }
        Commands::Stats => {
            cmd_stats(&config).await?;
        }
        Commands::Health => {
            cmd_health(&config).await?;
        }
    }

    Ok(())
}

async fn build_pipeline(config: &Config) -> Result<(IngestPipeline, Arc<LanceDbClient>)> {
    let store = Arc::new(
        DocumentStore::new(config.storage.clone()).context("Failed to open document store")?,
    );
    let index = Arc::new(
        LanceDbClient::new(config.index.clone())
            .await
            .context("Failed to open index")?,
    );

    if !index.ping().await? {
        error!("Cannot connect to LanceDB at {}", config.index.uri);
        return Err(anyhow::anyhow!("Index connection failed"));
    }

    let llm = Arc::new(OllamaClient::new(&config.llm).context("Failed to build LLM client")?);
    let indexer = Arc::new(ChunkIndexer::new(index.clone(), llm));
    let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);

    Ok((IngestPipeline::new(store, indexer, chunker), index))
}

async fn cmd_ingest(config: &Config, dir: &PathBuf, colored: bool) -> Result<()> {
    info!("Ingesting documents from {}", dir.display());

    let (pipeline, _index) = build_pipeline(config).await?;
    let stats = pipeline
        .ingest_dir(dir, colored)
        .await
        .context("Ingestion failed")?;

    println!(
        "{}",
        logging::format_success(&format!(
            "Ingested {} files ({} chunks), {} failed ({:.0}% success)",
            stats.files_indexed,
            stats.chunks_created,
            stats.files_failed,
            stats.success_rate()
        ))
    );

    Ok(())
}

async fn cmd_crawl(config: &Config, url: Option<String>, max_pages: Option<usize>) -> Result<()> {
    let url = url
        .or_else(|| config.crawler.website_url.clone())
        .context("No URL given and crawler.website_url is not configured")?;

    let mut crawler_config = config.crawler.clone();
    if let Some(max_pages) = max_pages {
        crawler_config.max_pages = max_pages;
    }

    info!("Crawling {}", url);

    let (pipeline, _index) = build_pipeline(config).await?;
    let crawler = SiteCrawler::new(&crawler_config)?;
    let stats = crawler
        .crawl_into(&pipeline, &url)
        .await
        .context("Crawl failed")?;

    println!(
        "{}",
        logging::format_success(&format!(
            "Crawled {}: {} pages ingested ({} chunks), {} failed",
            url, stats.files_indexed, stats.chunks_created, stats.files_failed
        ))
    );

    Ok(())
}

async fn cmd_search(config: &Config, question: &str, top_k: usize) -> Result<()> {
    info!("Searching for: {}", question);

    let index = Arc::new(
        LanceDbClient::new(config.index.clone())
            .await
            .context("Failed to open index")?,
    );
    let llm = Arc::new(OllamaClient::new(&config.llm)?);
    let retriever = Retriever::new(index, llm, config.query.top_k);

    let hits = retriever
        .retrieve_with_limit(question, top_k)
        .await
        .context("Search failed")?;

    if hits.is_empty() {
        println!("\nNo results found for: \"{}\"\n", question);
        println!("Try ingesting documents first, or rephrasing the question.");
        return Ok(());
    }

    println!("\nSearch results for: \"{}\"\n", question);
    println!("{}", "=".repeat(80));

    for (idx, hit) in hits.iter().enumerate() {
        println!(
            "\n{}. {} #{} (score: {:.4})",
            idx + 1,
            hit.document,
            hit.ordinal,
            hit.score
        );

        if let Some(distance) = hit.distance {
            println!("   Distance: {:.4}", distance);
        }

        println!("   Preview:");
        for line in Validator::truncate_text(&hit.text, 300).lines().take(5) {
            println!("     {}", line);
        }
    }

    println!("\n{}", "=".repeat(80));
    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    let store = DocumentStore::new(config.storage.clone())?;
    let index = LanceDbClient::new(config.index.clone())
        .await
        .context("Failed to open index")?;

    let documents = store.list().await?;
    let entries = index.entry_count().await?;

    println!(
        "{}",
        logging::format_info(&format!(
            "{} documents stored, {} index entries",
            documents.len(),
            entries
        ))
    );

    for meta in documents {
        println!(
            "  {} ({} KB, modified {})",
            meta.filename,
            meta.size_kb(),
            meta.last_modified_display()
        );
    }

    Ok(())
}

async fn cmd_health(config: &Config) -> Result<()> {
    let llm = OllamaClient::new(&config.llm)?;

    match llm.health().await {
        Ok(true) => {
            println!(
                "{}",
                logging::format_success(&format!("backend at {} is ready", config.llm.base_url))
            );
            Ok(())
        }
        Ok(false) => {
            println!(
                "{}",
                logging::format_warning(&format!(
                    "models {} / {} not installed at {}",
                    config.llm.generate_model, config.llm.embed_model, config.llm.base_url
                ))
            );
            std::process::exit(1);
        }
        Err(e) => {
            println!("{}", logging::format_error(&e.to_string()));
            std::process::exit(1);
        }
    }
}
