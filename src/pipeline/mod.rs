//! Content pipelines - crawl, generate, repair, link, verify, publish.

mod refresh;

pub use refresh::{RefreshOutcome, RefreshPipeline, DEFAULT_MAX_WORDS, DEFAULT_MIN_WORDS};
