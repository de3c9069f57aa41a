//! Sitemap pages - inventory entries and staleness scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Days after which a page's last modification counts as stale.
pub const STALE_AFTER_DAYS: i64 = 365;

/// One page discovered from a site's sitemap.
///
/// Carries the discovery metadata (URL, lastmod) plus fields filled in
/// progressively by later stages: crawled content, word count, a content
/// hash for change detection, and an opportunity score used to rank
/// refresh candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapPage {
    /// Canonical URL of the page
    pub url: String,

    /// Title derived from the URL slug (or set after crawling)
    pub title: String,

    /// Last modification time from the sitemap, if declared
    pub last_modified: Option<DateTime<Utc>>,

    /// Age in days at discovery time, if lastmod was declared
    pub days_old: Option<i64>,

    /// Whether the page is older than the staleness threshold
    pub is_stale: bool,

    /// Refresh priority; higher scores are picked first
    pub opportunity_score: Option<f64>,

    /// Extracted page content, once crawled
    #[serde(default)]
    pub crawled_content: Option<String>,

    /// Word count of the crawled content
    #[serde(default)]
    pub word_count: Option<usize>,

    /// SHA-256 hash of the crawled content
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl SitemapPage {
    /// Create a page from its URL, deriving the title from the slug.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let title = title_from_url(&url);

        Self {
            url,
            title,
            last_modified: None,
            days_old: None,
            is_stale: false,
            opportunity_score: None,
            crawled_content: None,
            word_count: None,
            content_hash: None,
        }
    }

    /// Set the lastmod timestamp and derive age and staleness from it.
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        let days_old = (Utc::now() - last_modified).num_days();
        self.last_modified = Some(last_modified);
        self.days_old = Some(days_old);
        self.is_stale = days_old > STALE_AFTER_DAYS;
        self
    }

    /// Set an explicit title, overriding the slug-derived one.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the refresh priority score.
    pub fn with_opportunity_score(mut self, score: f64) -> Self {
        self.opportunity_score = Some(score);
        self
    }

    /// Attach crawled content, updating word count and content hash.
    pub fn with_crawled_content(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        self.word_count = Some(content.split_whitespace().count());
        self.content_hash = Some(Self::hash_content(&content));
        self.crawled_content = Some(content);
        self
    }

    /// Calculate SHA-256 hash of content.
    pub fn hash_content(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Whether new content differs from the recorded hash.
    ///
    /// Returns `true` when no hash has been recorded yet.
    pub fn content_changed(&self, content: &str) -> bool {
        match &self.content_hash {
            Some(hash) => *hash != Self::hash_content(content),
            None => true,
        }
    }

    /// The URL's trailing path segment, hyphens intact.
    pub fn slug(&self) -> &str {
        slug_of(&self.url)
    }
}

fn slug_of(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
}

/// Derive a human-readable title from a URL slug.
///
/// `/blog/best-coffee-grinders` becomes `Best Coffee Grinders`. Falls
/// back to the full URL when the path has no usable segment.
pub fn title_from_url(url: &str) -> String {
    let slug = slug_of(url);
    if slug.is_empty() || slug.contains("://") {
        return url.to_string();
    }

    let words: Vec<String> = slug
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        url.to_string()
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_title_from_url_slug() {
        assert_eq!(
            title_from_url("https://example.com/blog/best-coffee-grinders/"),
            "Best Coffee Grinders"
        );
        assert_eq!(title_from_url("https://example.com/about_us"), "About Us");
    }

    #[test]
    fn test_title_falls_back_to_url_for_bare_domain() {
        let page = SitemapPage::new("https://example.com");
        assert_eq!(page.title, "Example.com");
    }

    #[test]
    fn test_staleness_threshold() {
        let fresh = SitemapPage::new("https://example.com/a")
            .with_last_modified(Utc::now() - Duration::days(30));
        assert!(!fresh.is_stale);
        assert_eq!(fresh.days_old, Some(30));

        let stale = SitemapPage::new("https://example.com/b")
            .with_last_modified(Utc::now() - Duration::days(400));
        assert!(stale.is_stale);
    }

    #[test]
    fn test_content_changed_detects_edits() {
        let page = SitemapPage::new("https://example.com/a").with_crawled_content("hello world");
        assert_eq!(page.word_count, Some(2));
        assert!(!page.content_changed("hello world"));
        assert!(page.content_changed("hello world!"));

        let uncrawled = SitemapPage::new("https://example.com/b");
        assert!(uncrawled.content_changed("anything"));
    }
}
