//! Readable-text extraction for a URL.
//!
//! Two independent strategies are raced: a clean-text reader service, and
//! a raw proxy fetch followed by DOM reduction. The reader is cleaner but
//! sometimes rate-limited; the proxy route is messier but reliable. Each
//! strategy validates its own output, so an empty or blocked page counts
//! as a strategy failure rather than a hollow win.

pub mod readability;

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::{CrawlError, CrawlResult, FetchError, FetchResult};
use crate::fetch::{race, ProxyFetcher, RaceStrategy};

pub use readability::{reduce, truncate_chars};

/// Configuration for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Extracted text shorter than this is a strategy failure
    pub min_content_len: usize,

    /// Character budget for reader-service output
    pub reader_max_len: usize,

    /// Character budget for DOM-reduction output
    pub dom_max_len: usize,

    /// Base URL of the clean-text reader service
    pub reader_base: String,

    /// Timeout for the reader strategy
    pub reader_timeout: Duration,

    /// Timeout for the DOM strategy (covers its inner proxy race)
    pub dom_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_content_len: 200,
            reader_max_len: 35_000,
            dom_max_len: 30_000,
            reader_base: "https://r.jina.ai/".to_string(),
            reader_timeout: Duration::from_secs(10),
            dom_timeout: Duration::from_secs(15),
        }
    }
}

/// Extracts readable text from a URL by racing two strategies.
///
/// # Example
///
/// ```rust,ignore
/// use contentops::extract::ContentExtractor;
///
/// let extractor = ContentExtractor::new();
/// let text = extractor.extract("https://example.com/post").await?;
/// ```
#[derive(Clone)]
pub struct ContentExtractor {
    fetcher: ProxyFetcher,
    client: reqwest::Client,
    config: ExtractorConfig,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    /// Create a new extractor with default settings.
    pub fn new() -> Self {
        Self {
            fetcher: ProxyFetcher::new(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            config: ExtractorConfig::default(),
        }
    }

    /// Use a custom fetcher.
    pub fn with_fetcher(mut self, fetcher: ProxyFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Use a custom configuration.
    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    /// Extract readable text from a URL.
    ///
    /// Fails with [`CrawlError::Failed`] carrying the underlying race
    /// error when both strategies fail.
    pub async fn extract(&self, url: &str) -> CrawlResult<String> {
        Url::parse(url).map_err(|_| CrawlError::InvalidUrl {
            url: url.to_string(),
        })?;

        debug!(url = %url, "content extraction starting");

        let strategies = vec![
            RaceStrategy::new(
                "reader",
                reader_fetch(
                    self.client.clone(),
                    self.config.reader_base.clone(),
                    url.to_string(),
                    self.config.min_content_len,
                    self.config.reader_max_len,
                ),
            )
            .with_timeout(self.config.reader_timeout),
            RaceStrategy::new(
                "dom",
                dom_fetch(
                    self.fetcher.clone(),
                    url.to_string(),
                    self.config.min_content_len,
                    self.config.dom_max_len,
                ),
            )
            .with_timeout(self.config.dom_timeout),
        ];

        race(strategies).await.map_err(|source| CrawlError::Failed {
            url: url.to_string(),
            source,
        })
    }
}

/// Reader-service strategy: clean text straight from the service.
async fn reader_fetch(
    client: reqwest::Client,
    reader_base: String,
    url: String,
    min_len: usize,
    max_len: usize,
) -> FetchResult<String> {
    let response = client
        .get(format!("{}{}", reader_base, url))
        .send()
        .await
        .map_err(|e| FetchError::Http(Box::new(e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::ServerError {
            status: status.as_u16(),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| FetchError::Http(Box::new(e)))?;

    validate_text(text, min_len, max_len, "reader output blocked or too short")
}

/// DOM-reduction strategy: raw proxy fetch, then strip to readable text.
async fn dom_fetch(
    fetcher: ProxyFetcher,
    url: String,
    min_len: usize,
    max_len: usize,
) -> FetchResult<String> {
    let response = fetcher.fetch(&url).await?;
    let text = readability::reduce(&response.body);

    validate_text(text, min_len, max_len, "DOM extraction empty")
}

fn validate_text(
    text: String,
    min_len: usize,
    max_len: usize,
    reason: &str,
) -> FetchResult<String> {
    if text.contains("Access Denied") || text.len() < min_len {
        return Err(FetchError::ContentRejected {
            reason: reason.to_string(),
        });
    }
    Ok(truncate_chars(text, max_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_short_text() {
        let result = validate_text("too short".to_string(), 200, 1000, "short");
        assert!(matches!(result, Err(FetchError::ContentRejected { .. })));
    }

    #[test]
    fn test_validate_rejects_blocked_page() {
        let text = format!("Access Denied {}", "x".repeat(500));
        let result = validate_text(text, 200, 1000, "blocked");
        assert!(matches!(result, Err(FetchError::ContentRejected { .. })));
    }

    #[test]
    fn test_validate_truncates_to_budget() {
        let text = "a".repeat(5_000);
        let result = validate_text(text, 200, 1_000, "n/a").unwrap();
        assert_eq!(result.len(), 1_000);
    }

    #[tokio::test]
    async fn test_extract_rejects_invalid_url() {
        let extractor = ContentExtractor::new();
        let result = extractor.extract("not a url").await;
        assert!(matches!(result, Err(CrawlError::InvalidUrl { .. })));
    }
}
