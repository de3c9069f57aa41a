//! End-to-end article pipeline.
//!
//! [`RefreshPipeline`] composes the crawl, generate, repair, link, and
//! publish stages into two operations: refreshing an existing page and
//! drafting a new article from a keyword. Every external call (AI,
//! publish) runs under the pipeline's retry policy; model output goes
//! through the JSON repair loop before anything trusts it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::extract::ContentExtractor;
use crate::maintenance::PageRefresher;
use crate::repair::{parse_with_repair, DEFAULT_REPAIR_ATTEMPTS};
use crate::retry::{with_retry, RetryPolicy};
use crate::traits::{AiClient, OutputFormat, PromptRequest, PublishReceipt, PublishStatus, Publisher};
use crate::types::content::{enforce_word_count, process_internal_links, GeneratedContent};
use crate::types::page::SitemapPage;

/// Word-count floor for accepted drafts.
pub const DEFAULT_MIN_WORDS: usize = 600;

/// Word-count ceiling for accepted drafts.
pub const DEFAULT_MAX_WORDS: usize = 4_000;

/// What one pipeline run produced.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Final title of the draft
    pub title: String,

    /// Permalink reported by the publish target, when available
    pub link: Option<String>,

    /// Word count of the published body
    pub word_count: usize,

    /// The publish target's receipt
    pub receipt: PublishReceipt,
}

/// Crawl-generate-publish pipeline over pluggable AI and publisher backends.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RefreshPipeline::new(ai, publisher)
///     .with_extractor(extractor)
///     .with_link_pool(inventory.clone())
///     .with_publish_status(PublishStatus::Publish);
///
/// let outcome = pipeline.refresh_page(&page).await?;
/// ```
pub struct RefreshPipeline<A: AiClient, P: Publisher> {
    extractor: ContentExtractor,
    ai: Arc<A>,
    publisher: Arc<P>,
    retry: RetryPolicy,
    repair_attempts: u32,
    min_words: usize,
    max_words: usize,
    publish_status: PublishStatus,
    link_pool: Option<Vec<SitemapPage>>,
}

impl<A: AiClient, P: Publisher> RefreshPipeline<A, P> {
    /// Create a pipeline with default extractor, retry, and word bounds.
    ///
    /// Posts land as drafts until [`with_publish_status`] says otherwise.
    ///
    /// [`with_publish_status`]: RefreshPipeline::with_publish_status
    pub fn new(ai: Arc<A>, publisher: Arc<P>) -> Self {
        Self {
            extractor: ContentExtractor::new(),
            ai,
            publisher,
            retry: RetryPolicy::default(),
            repair_attempts: DEFAULT_REPAIR_ATTEMPTS,
            min_words: DEFAULT_MIN_WORDS,
            max_words: DEFAULT_MAX_WORDS,
            publish_status: PublishStatus::Draft,
            link_pool: None,
        }
    }

    /// Use a custom content extractor.
    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Use a custom retry policy for AI and publish calls.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the JSON repair budget per generation.
    pub fn with_repair_attempts(mut self, attempts: u32) -> Self {
        self.repair_attempts = attempts;
        self
    }

    /// Set the accepted word-count range.
    pub fn with_word_bounds(mut self, min_words: usize, max_words: usize) -> Self {
        self.min_words = min_words;
        self.max_words = max_words.max(min_words);
        self
    }

    /// Set the target status for published posts.
    pub fn with_publish_status(mut self, status: PublishStatus) -> Self {
        self.publish_status = status;
        self
    }

    /// Provide a page inventory for internal-link resolution.
    ///
    /// Without a pool, `[LINK_CANDIDATE: ...]` markers are unwrapped to
    /// plain text.
    pub fn with_link_pool(mut self, pages: Vec<SitemapPage>) -> Self {
        self.link_pool = Some(pages);
        self
    }

    /// Refresh an existing page: re-crawl, regenerate, and republish.
    ///
    /// Uses the page's cached `crawled_content` when present, otherwise
    /// extracts it fresh.
    pub async fn refresh_page(&self, page: &SitemapPage) -> Result<RefreshOutcome> {
        let source = match &page.crawled_content {
            Some(content) => content.clone(),
            None => self.extractor.extract(&page.url).await?,
        };
        debug!(url = %page.url, source_len = source.len(), "refreshing page");

        let request = PromptRequest::new("refresh_article", OutputFormat::Json)
            .with_arg("title", &page.title)
            .with_arg("url", &page.url)
            .with_grounding(source);

        self.generate_and_publish(request, &page.title).await
    }

    /// Draft and publish a brand-new article for a keyword.
    pub async fn draft_article(&self, keyword: &str) -> Result<RefreshOutcome> {
        debug!(keyword, "drafting new article");

        let request = PromptRequest::new("write_article", OutputFormat::Json)
            .with_arg("keyword", keyword);

        self.generate_and_publish(request, keyword).await
    }

    /// Shared back half: generate, repair, normalize, link, verify, publish.
    async fn generate_and_publish(
        &self,
        request: PromptRequest,
        fallback_title: &str,
    ) -> Result<RefreshOutcome> {
        let raw = with_retry(|| self.ai.call(request.clone()), &self.retry).await?;

        let draft: GeneratedContent =
            parse_with_repair(&raw, |broken| self.ai.repair_json(broken), self.repair_attempts)
                .await?;
        let mut draft = draft.normalized(fallback_title);

        if let Some(pool) = &self.link_pool {
            draft.content = process_internal_links(&draft.content, pool);
        }

        let word_count = enforce_word_count(&draft.content, self.min_words, self.max_words)?;

        let receipt =
            with_retry(|| self.publisher.publish(&draft, self.publish_status), &self.retry)
                .await?;

        if !receipt.success {
            return Err(PipelineError::Publish {
                message: receipt.message,
            });
        }

        info!(
            title = %draft.title,
            word_count,
            link = receipt.link.as_deref().unwrap_or(""),
            "draft published"
        );

        Ok(RefreshOutcome {
            title: draft.title,
            link: receipt.link.clone(),
            word_count,
            receipt,
        })
    }
}

#[async_trait]
impl<A: AiClient, P: Publisher> PageRefresher for RefreshPipeline<A, P> {
    async fn refresh(&self, page: &SitemapPage) -> Result<RefreshOutcome> {
        self.refresh_page(page).await
    }
}
