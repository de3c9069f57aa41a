//! Typed errors for the content-operations pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Nothing in this taxonomy is fatal to the process: race and retry
//! budgets are spent locally, and an exhausted budget becomes a single
//! item's failure record rather than aborting sibling work.

use thiserror::Error;

/// Errors produced by a single fetch strategy or by a race over strategies.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A strategy exceeded its per-strategy timeout
    #[error("strategy '{strategy}' timed out")]
    Timeout { strategy: String },

    /// Underlying HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response carried a server-error status (5xx does not qualify as a win)
    #[error("server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Strategy produced a response but its content failed validation
    #[error("content rejected: {reason}")]
    ContentRejected { reason: String },

    /// Every race participant failed or timed out
    #[error("all {attempts} fetch strategies exhausted")]
    AllStrategiesExhausted { attempts: usize },
}

/// Errors that can occur while obtaining readable text for a URL.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Both extraction strategies failed; carries the underlying race error
    #[error("crawl failed for {url}: {source}")]
    Failed {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Outcome of retrying a single async operation.
///
/// Kept generic over the operation's own error so callers can inspect
/// the final failure; converts into [`PipelineError`] at the pipeline
/// boundary.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The retry budget was spent; carries the last attempt's failure
    #[error("operation failed after {attempts} attempts: {source}")]
    OperationFailed {
        attempts: u32,
        #[source]
        source: E,
    },

    /// Cancellation was observed mid-wait; never reported as a failure
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Content extraction failed
    #[error("crawl failed: {0}")]
    Crawl(#[from] CrawlError),

    /// AI provider unavailable or failed
    #[error("AI service error: {0}")]
    Ai(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Retry budget exhausted on a single external call
    #[error("operation failed after {attempts} attempts: {source}")]
    OperationFailed {
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// Structured output could not be salvaged within the repair budget.
    ///
    /// Preserves the last raw text and parse error for diagnostics.
    #[error("unrepairable model output: {reason}")]
    UnrepairableOutput { raw: String, reason: String },

    /// Generated content is below the word-count floor
    #[error("content too short: {word_count} words")]
    ContentTooShort { word_count: usize, content: String },

    /// Generated content exceeds the word-count ceiling
    #[error("content too long: {word_count} words")]
    ContentTooLong { word_count: usize, content: String },

    /// A batch worker panicked; isolated so siblings keep running
    #[error("worker panicked: {message}")]
    WorkerPanic { message: String },

    /// Publish call was rejected by the target site
    #[error("publish failed: {message}")]
    Publish { message: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl<E> From<RetryError<E>> for PipelineError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: RetryError<E>) -> Self {
        match err {
            RetryError::OperationFailed { attempts, source } => PipelineError::OperationFailed {
                attempts,
                source: Box::new(source),
            },
            RetryError::Cancelled => PipelineError::Cancelled,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for crawl operations.
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;
