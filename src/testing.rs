//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the pipeline
//! without making real AI or network calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{PipelineError, Result};
use crate::traits::{AiClient, PromptRequest, PublishReceipt, PublishStatus, Publisher};
use crate::types::content::GeneratedContent;

/// A mock AI implementation for testing.
///
/// Returns deterministic, configurable responses keyed by prompt name.
/// Responses for a key are consumed front to back, so a queue of two
/// responses serves the first call the first text and the second call
/// the second text. Useful for testing pipeline logic without real
/// LLM calls.
#[derive(Default)]
pub struct MockAi {
    /// Queued responses by prompt key
    responses: Arc<RwLock<HashMap<String, VecDeque<String>>>>,

    /// Remaining failures to inject by prompt key
    failures: Arc<RwLock<HashMap<String, u32>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockAiCall>>>,
}

/// Record of a call made to the mock AI.
#[derive(Debug, Clone)]
pub struct MockAiCall {
    pub key: String,
    pub args: HashMap<String, String>,
    pub grounding_len: usize,
}

impl MockAi {
    /// Create a new mock AI with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a prompt key.
    pub fn with_response(self, key: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .entry(key.into())
            .or_default()
            .push_back(response.into());
        self
    }

    /// Make the next `n` calls for a prompt key fail before any
    /// queued response is served.
    pub fn failing_times(self, key: impl Into<String>, n: u32) -> Self {
        self.failures.write().unwrap().insert(key.into(), n);
        self
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<MockAiCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of calls made for a prompt key.
    pub fn call_count(&self, key: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.key == key)
            .count()
    }
}

#[async_trait]
impl AiClient for MockAi {
    async fn call(&self, request: PromptRequest) -> Result<String> {
        self.calls.write().unwrap().push(MockAiCall {
            key: request.key.clone(),
            args: request.args.clone(),
            grounding_len: request.grounding.as_deref().map_or(0, str::len),
        });

        {
            let mut failures = self.failures.write().unwrap();
            if let Some(remaining) = failures.get_mut(&request.key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(PipelineError::Ai(
                        format!("injected failure for '{}'", request.key).into(),
                    ));
                }
            }
        }

        self.responses
            .write()
            .unwrap()
            .get_mut(&request.key)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                PipelineError::Ai(
                    format!("no canned response for prompt '{}'", request.key).into(),
                )
            })
    }
}

/// A mock publisher for testing.
///
/// Records every draft it receives and returns configurable receipts.
#[derive(Default)]
pub struct MockPublisher {
    /// Drafts received, with the requested status
    published: Arc<RwLock<Vec<(GeneratedContent, PublishStatus)>>>,

    /// Remaining transport failures to inject
    failures: Arc<RwLock<u32>>,

    /// Whether receipts report rejection instead of acceptance
    reject: bool,
}

impl MockPublisher {
    /// Create a publisher that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` publish calls fail at the transport level.
    pub fn failing_times(self, n: u32) -> Self {
        *self.failures.write().unwrap() = n;
        self
    }

    /// Make receipts report rejection.
    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    /// Drafts received so far.
    pub fn published(&self) -> Vec<(GeneratedContent, PublishStatus)> {
        self.published.read().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(
        &self,
        draft: &GeneratedContent,
        status: PublishStatus,
    ) -> Result<PublishReceipt> {
        {
            let mut failures = self.failures.write().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(PipelineError::Publish {
                    message: "injected transport failure".to_string(),
                });
            }
        }

        self.published.write().unwrap().push((draft.clone(), status));

        if self.reject {
            Ok(PublishReceipt::rejected("injected rejection"))
        } else {
            Ok(PublishReceipt::accepted(
                "post created",
                format!("https://example.com/{}", draft.slug),
            ))
        }
    }
}
