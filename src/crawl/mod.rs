// file: src/crawl/mod.rs
// description: website crawler feeding pages into the ingest pipeline
// reference: https://docs.rs/scraper

use crate::config::CrawlerConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::{IngestPipeline, IngestStats};
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::{info, warn};

/// Pages with fewer words than this are navigation shells, not content.
const MIN_CONTENT_WORDS: usize = 50;

const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/117.0";

/// Breadth-first same-host crawler. Each page becomes a plain-text
/// document named after its URL path and goes through the regular ingest
/// pipeline, so crawled content is stored, chunked and indexed exactly
/// like an upload.
pub struct SiteCrawler {
    client: reqwest::Client,
    max_pages: usize,
}

impl SiteCrawler {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(FALLBACK_USER_AGENT)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_pages: config.max_pages.max(1),
        })
    }

    /// Crawl from `base_url` and ingest every content page found on the
    /// same host. Per-page failures are logged and skipped; the crawl
    /// itself only fails when the base URL is unusable.
    pub async fn crawl_into(&self, pipeline: &IngestPipeline, base_url: &str) -> Result<IngestStats> {
        let base = Url::parse(base_url)
            .map_err(|e| PipelineError::Validation(format!("Invalid crawl URL {}: {}", base_url, e)))?;

        let mut queue = VecDeque::from([base.clone()]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut stats = IngestStats::new();

        while let Some(url) = queue.pop_front() {
            if visited.len() >= self.max_pages {
                break;
            }
            if !visited.insert(url.to_string()) {
                continue;
            }

            if visited.len() > 1 {
                // don't hammer the site
                tokio::time::sleep(Duration::from_millis(500)).await;
            }

            let html = match self.fetch_page(&url).await {
                Ok(Some(html)) => html,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    stats.files_failed += 1;
                    continue;
                }
            };

            for link in page_links(&html, &base) {
                if !visited.contains(link.as_str()) {
                    queue.push_back(link);
                }
            }

            let text = page_text(&html);
            if text.split_whitespace().count() < MIN_CONTENT_WORDS {
                info!("Skipping {} (too little content)", url);
                continue;
            }

            let filename = filename_for_url(&url);
            if self.unchanged(pipeline, &filename, &text).await {
                info!("Skipping unchanged page {}", url);
                continue;
            }

            match pipeline.ingest_bytes(&filename, text.as_bytes()).await {
                Ok(report) => {
                    stats.files_indexed += 1;
                    stats.chunks_created += report.chunks_indexed;
                    stats.total_bytes_processed += text.len() as u64;
                    info!("Crawled {} into {}", url, filename);
                }
                Err(e) => {
                    warn!("Failed to ingest crawled page {}: {}", url, e);
                    stats.files_failed += 1;
                }
            }
        }

        info!(
            "Crawl finished: {} pages ingested, {} failed",
            stats.files_indexed, stats.files_failed
        );
        Ok(stats)
    }

    /// Fetch one page. 404 is a dead link, not a failure; non-HTML
    /// responses are skipped.
    async fn fetch_page(&self, url: &Url) -> Result<Option<String>> {
        info!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PipelineError::Crawl(format!("request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!("404 from {}, skipping", url);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PipelineError::Crawl(format!(
                "status {} from {}",
                response.status(),
                url
            )));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("text/html"));
        if !is_html {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Crawl(format!("failed to read body: {}", e)))?;
        Ok(Some(body))
    }

    /// A page whose text matches the stored bytes needs no re-embedding.
    async fn unchanged(&self, pipeline: &IngestPipeline, filename: &str, text: &str) -> bool {
        matches!(
            pipeline.store().read(filename).await,
            Ok(bytes) if bytes == text.as_bytes()
        )
    }
}

const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "noscript", "iframe",
];

/// Visible text of a page, title first, boilerplate chrome stripped.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").expect("valid selector");
    let title: String = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let body_selector = Selector::parse("body").expect("valid selector");
    let mut lines = Vec::new();

    if let Some(body) = document.select(&body_selector).next() {
        for node in body.descendants() {
            if let scraper::Node::Text(text) = node.value() {
                let inside_chrome = node.ancestors().any(|a| match a.value() {
                    scraper::Node::Element(el) => SKIP_TAGS.contains(&el.name()),
                    _ => false,
                });
                if inside_chrome {
                    continue;
                }
                let line = text.text.trim();
                if !line.is_empty() {
                    lines.push(line.to_string());
                }
            }
        }
    }

    if title.is_empty() {
        lines.join("\n")
    } else {
        format!("{}\n\n{}", title, lines.join("\n"))
    }
}

/// Same-host links reachable from the page, with fragments dropped.
pub fn page_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("valid selector");

    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut url) = base.join(href) else {
            continue;
        };
        url.set_fragment(None);
        if url.host_str() == base.host_str() && !links.contains(&url) {
            links.push(url);
        }
    }
    links
}

/// Storage filename for a crawled page, derived from its URL path the
/// way the store's validator allows: no separators, no traversal.
pub fn filename_for_url(url: &Url) -> String {
    let mut name: String = url
        .path()
        .trim_matches('/')
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();

    while name.contains("..") {
        name = name.replace("..", ".");
    }
    let name = name.trim_matches(|c| c == '_' || c == '.').to_string();

    if name.is_empty() {
        "index.txt".to_string()
    } else {
        format!("{}.txt", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html>
      <head><title>Joe's Diner</title><script>var x = 1;</script></head>
      <body>
        <nav><a href="/menu">Menu</a></nav>
        <header>banner text</header>
        <p>Open Tuesday through Sunday.</p>
        <p>Happy hour from four to six.</p>
        <a href="/hours#today">Hours</a>
        <a href="https://other.example.org/away">Elsewhere</a>
        <footer>copyright</footer>
      </body>
    </html>"#;

    #[test]
    fn test_page_text_strips_chrome_and_keeps_title() {
        let text = page_text(PAGE);

        assert!(text.starts_with("Joe's Diner"));
        assert!(text.contains("Open Tuesday through Sunday."));
        assert!(text.contains("Happy hour from four to six."));
        assert!(!text.contains("var x"));
        assert!(!text.contains("banner text"));
        assert!(!text.contains("copyright"));
    }

    #[test]
    fn test_page_links_same_host_only() {
        let base = Url::parse("https://diner.example.com/").unwrap();
        let links = page_links(PAGE, &base);

        let as_strings: Vec<String> = links.iter().map(|u| u.to_string()).collect();
        assert!(as_strings.contains(&"https://diner.example.com/menu".to_string()));
        // fragment dropped
        assert!(as_strings.contains(&"https://diner.example.com/hours".to_string()));
        assert!(!as_strings.iter().any(|u| u.contains("other.example.org")));
    }

    #[test]
    fn test_filename_for_url() {
        let base = Url::parse("https://diner.example.com/").unwrap();
        assert_eq!(filename_for_url(&base), "index.txt");

        let page = Url::parse("https://diner.example.com/products/personal-loan").unwrap();
        assert_eq!(filename_for_url(&page), "products_personal-loan.txt");

        let tricky = Url::parse("https://diner.example.com/a/../b?x=1").unwrap();
        let name = filename_for_url(&tricky);
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_crawler_builds_from_config() {
        let config = crate::config::CrawlerConfig::default();
        assert!(SiteCrawler::new(&config).is_ok());
    }
}
