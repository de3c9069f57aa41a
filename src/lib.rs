//! Content-Operations Orchestration Library
//!
//! A library for running AI-assisted content operations against a live
//! site: discover pages from sitemaps, extract readable text through
//! racing fetch strategies, generate and repair structured drafts, and
//! publish them, in batches or from an autonomous maintenance loop.
//!
//! # Design Philosophy
//!
//! **"Race everything, trust nothing"**
//!
//! - Fetches race parallel strategies; first valid response wins
//! - Model output is parsed defensively and repaired, never trusted
//! - Failures stay local: one bad item never sinks a batch
//! - Cancellation is cooperative at every level (item, batch, engine)
//! - Library handles mechanics, app handles prompts and policy
//!
//! # Usage
//!
//! ```rust,ignore
//! use contentops::{RefreshPipeline, MaintenanceContext, MaintenanceEngine};
//! use contentops::testing::{MockAi, MockPublisher};
//!
//! let pipeline = Arc::new(RefreshPipeline::new(ai, publisher));
//!
//! // One-off refresh of a single page
//! let outcome = pipeline.refresh_page(&page).await?;
//!
//! // Or hand the pipeline to the background engine
//! let engine = MaintenanceEngine::new(pipeline);
//! engine.start(MaintenanceContext::new(pages));
//! ```
//!
//! # Modules
//!
//! - [`fetch`] - Racing multi-strategy HTTP fetching
//! - [`extract`] - Readable-text extraction (reader service vs DOM)
//! - [`sitemap`] - Sitemap discovery and flattening
//! - [`retry`] - Retry with exponential backoff and cancellation
//! - [`repair`] - Defensive JSON parsing with AI-assisted repair
//! - [`batch`] - Bounded-concurrency batch runner
//! - [`pipeline`] - Crawl-generate-publish pipeline
//! - [`maintenance`] - Autonomous background refresh engine
//! - [`publish`] - Publishing backends (WordPress REST)
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod batch;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod maintenance;
pub mod pipeline;
pub mod publish;
pub mod repair;
pub mod retry;
pub mod security;
pub mod sitemap;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CrawlError, FetchError, PipelineError, RetryError};
pub use traits::{AiClient, OutputFormat, PromptRequest, PublishReceipt, PublishStatus, Publisher};
pub use types::{
    content::{enforce_word_count, process_internal_links, slugify, FaqEntry, GeneratedContent},
    page::SitemapPage,
    work::{BatchProgress, CancellationSet, WorkItem},
};

// Re-export pipeline components
pub use batch::{run_batch, BatchOptions, ItemOutcome};
pub use extract::{ContentExtractor, ExtractorConfig};
pub use fetch::{race, FetchedResponse, ProxyFetcher, RaceStrategy};
pub use maintenance::{
    LogSink, MaintenanceContext, MaintenanceEngine, PageRefresher, SUCCESS_MARKER,
};
pub use pipeline::{RefreshOutcome, RefreshPipeline};
pub use publish::WordPressPublisher;
pub use repair::{parse_with_repair, strip_json_wrappers};
pub use retry::{with_retry, with_retry_cancellable, RetryPolicy};
pub use security::{AiCredentials, SecretString, WordPressCredentials};
pub use sitemap::{crawl_sitemap, parse_sitemap_document, SitemapDocument, SitemapEntry};
