//! Sitemap discovery - fetch, parse, and flatten a site's sitemap tree.
//!
//! Handles both plain `<urlset>` documents and `<sitemapindex>` trees by
//! breadth-first traversal. Discovery is capped at [`MAX_SITEMAP_DOCS`]
//! documents so a pathological index cannot run unbounded, and URLs are
//! deduplicated in first-seen order.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::error::{CrawlError, CrawlResult};
use crate::fetch::ProxyFetcher;
use crate::types::page::SitemapPage;

/// Hard cap on sitemap documents fetched per discovery run.
pub const MAX_SITEMAP_DOCS: usize = 100;

/// One `<url>` entry pulled out of a sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// The split contents of one sitemap document.
#[derive(Debug, Default)]
pub struct SitemapDocument {
    /// Nested sitemap locations, from `<sitemapindex>` entries
    pub sitemaps: Vec<String>,

    /// Page entries, from `<urlset>` entries
    pub pages: Vec<SitemapEntry>,
}

fn block_re(tag: &str) -> Regex {
    // (?s) so entries spanning lines still match.
    Regex::new(&format!(r"(?s)<{tag}\b[^>]*>(.*?)</{tag}>")).unwrap()
}

fn loc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| block_re("loc"))
}

fn lastmod_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| block_re("lastmod"))
}

fn inner_text(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .map(|c| c[1].trim().trim_start_matches("<![CDATA[").trim_end_matches("]]>").trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse one sitemap document into nested sitemap locations and page entries.
///
/// Regex-based rather than a full XML parse: sitemaps in the wild are
/// frequently malformed, and `<loc>`/`<lastmod>` pairs are all that is
/// needed. Entries without a `<loc>` are dropped.
pub fn parse_sitemap_document(text: &str) -> SitemapDocument {
    static SITEMAP_BLOCK: OnceLock<Regex> = OnceLock::new();
    static URL_BLOCK: OnceLock<Regex> = OnceLock::new();

    let sitemap_block = SITEMAP_BLOCK.get_or_init(|| block_re("sitemap"));
    let url_block = URL_BLOCK.get_or_init(|| block_re("url"));

    let mut doc = SitemapDocument::default();

    for cap in sitemap_block.captures_iter(text) {
        if let Some(loc) = inner_text(loc_re(), &cap[1]) {
            doc.sitemaps.push(loc);
        }
    }

    for cap in url_block.captures_iter(text) {
        if let Some(loc) = inner_text(loc_re(), &cap[1]) {
            doc.pages.push(SitemapEntry {
                loc,
                lastmod: inner_text(lastmod_re(), &cap[1]),
            });
        }
    }

    doc
}

/// Parse a sitemap `<lastmod>` value.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates; anything
/// else is treated as absent rather than failing discovery.
pub fn parse_lastmod(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Crawl a sitemap tree breadth-first and return the discovered pages.
///
/// `root_url` is typically `{site}/sitemap.xml` or `sitemap_index.xml`.
/// A failure on the root document is an error; a failure on a nested
/// document is logged and skipped so one broken branch does not lose
/// the rest of the tree. `on_progress` fires after each document with
/// the running page count.
pub async fn crawl_sitemap<P>(
    fetcher: &ProxyFetcher,
    root_url: &str,
    mut on_progress: P,
) -> CrawlResult<Vec<SitemapPage>>
where
    P: FnMut(usize),
{
    let mut pages: IndexMap<String, SitemapPage> = IndexMap::new();
    let mut queue: VecDeque<String> = VecDeque::from([root_url.to_string()]);
    let mut fetched = 0usize;

    while let Some(doc_url) = queue.pop_front() {
        if fetched >= MAX_SITEMAP_DOCS {
            warn!(
                limit = MAX_SITEMAP_DOCS,
                "sitemap document cap reached, stopping discovery"
            );
            break;
        }
        fetched += 1;

        let response = match fetcher.fetch(&doc_url).await {
            Ok(response) => response,
            Err(e) if fetched == 1 => {
                return Err(CrawlError::Failed {
                    url: doc_url,
                    source: e,
                });
            }
            Err(e) => {
                warn!(url = %doc_url, error = %e, "skipping unreachable nested sitemap");
                continue;
            }
        };

        let doc = parse_sitemap_document(&response.body);
        debug!(
            url = %doc_url,
            nested = doc.sitemaps.len(),
            entries = doc.pages.len(),
            "parsed sitemap document"
        );

        queue.extend(doc.sitemaps);

        for entry in doc.pages {
            if pages.contains_key(&entry.loc) {
                continue;
            }
            let mut page = SitemapPage::new(entry.loc.clone());
            if let Some(lastmod) = entry.lastmod.as_deref().and_then(parse_lastmod) {
                page = page.with_last_modified(lastmod);
            }
            pages.insert(entry.loc, page);
        }

        on_progress(pages.len());
    }

    Ok(pages.into_values().collect())
}
