//! AI trait for text-generation operations.
//!
//! The pipeline never talks to a model provider directly. Every call
//! goes through [`AiClient`] with a named [`PromptRequest`], so the
//! provider, prompt templates, and transport stay swappable and the
//! pipeline stays testable with mocks.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// The shape of output a prompt asks the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single JSON object, parsed downstream into structured content
    Json,

    /// An HTML fragment, used verbatim
    Html,
}

/// A named prompt invocation.
///
/// `key` selects a prompt template on the provider side ("refresh_article",
/// "write_article", "json_repair"); `args` fills its slots. `grounding`
/// is optional source material (crawled page text, a failed parse) the
/// template can quote from.
///
/// # Example
///
/// ```rust,ignore
/// let request = PromptRequest::new("write_article", OutputFormat::Json)
///     .with_arg("keyword", "best coffee grinders")
///     .with_grounding(crawled_text);
/// ```
#[derive(Debug, Clone)]
pub struct PromptRequest {
    /// Prompt template selector
    pub key: String,

    /// Template arguments by slot name
    pub args: HashMap<String, String>,

    /// Expected output shape
    pub format: OutputFormat,

    /// Optional source material for the template to draw on
    pub grounding: Option<String>,
}

impl PromptRequest {
    /// Create a request for the named prompt.
    pub fn new(key: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            key: key.into(),
            args: HashMap::new(),
            format,
            grounding: None,
        }
    }

    /// Fill one template slot.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Attach grounding material.
    pub fn with_grounding(mut self, grounding: impl Into<String>) -> Self {
        self.grounding = Some(grounding.into());
        self
    }
}

/// AI trait for text generation.
///
/// Implementations wrap a specific provider and handle transport,
/// authentication, and prompt templating. Responses come back as raw
/// text; parsing and repair happen downstream.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Run one prompt and return the raw response text.
    async fn call(&self, request: PromptRequest) -> Result<String>;

    /// Ask the model to fix its own malformed JSON.
    ///
    /// Feeds the broken text back under the `json_repair` prompt and
    /// returns the (hopefully) corrected output.
    async fn repair_json(&self, broken: String) -> Result<String> {
        self.call(
            PromptRequest::new("json_repair", OutputFormat::Json).with_grounding(broken),
        )
        .await
    }
}
