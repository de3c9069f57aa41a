//! Structured-output repair pipeline.
//!
//! AI models asked for JSON routinely wrap it in code fences or prose, or
//! produce near-JSON with a syntax slip. The repair pipeline strips the
//! well-known wrapper patterns, attempts a direct parse, and on failure
//! hands the raw text to a caller-supplied repair call (typically a cheap
//! model asked to fix the JSON), bounded by a small attempt budget.

use std::future::Future;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

/// Default number of repair-then-reparse rounds.
pub const DEFAULT_REPAIR_ATTEMPTS: u32 = 2;

/// Strip well-known wrapper noise from model output before parsing.
///
/// Handles ```json fences, bare ``` fences, and prose before the first
/// `{` or `[` / after the last `}` or `]`.
pub fn strip_json_wrappers(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text = text.trim();

    let start = text.find(['{', '[']);
    let end = text.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if s <= e => &text[s..=e],
        _ => text,
    }
}

/// Parse `raw` as JSON, invoking `repair` on failure and reparsing, up
/// to `max_attempts` repair rounds.
///
/// `repair` receives the current broken text and is expected to return a
/// corrected version; its output is wrapper-stripped again before each
/// reparse. Fails with [`PipelineError::UnrepairableOutput`] after the
/// budget is spent, preserving the last raw text and parse error.
pub async fn parse_with_repair<T, F, Fut>(raw: &str, mut repair: F, max_attempts: u32) -> Result<T>
where
    T: DeserializeOwned,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut current = raw.to_string();
    let mut repairs = 0u32;

    loop {
        let candidate = strip_json_wrappers(&current);
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => {
                if repairs > 0 {
                    debug!(repairs, "parse succeeded after repair");
                }
                return Ok(value);
            }
            Err(parse_err) => {
                if repairs >= max_attempts {
                    return Err(PipelineError::UnrepairableOutput {
                        raw: current,
                        reason: parse_err.to_string(),
                    });
                }

                warn!(
                    repairs,
                    error = %parse_err,
                    "structured parse failed, requesting repair"
                );
                repairs += 1;

                current = match repair(current.clone()).await {
                    Ok(fixed) => fixed,
                    // A failing repair call cannot be retried into sense;
                    // surface the diagnostics we have.
                    Err(e) => {
                        return Err(PipelineError::UnrepairableOutput {
                            raw: current,
                            reason: format!("repair call failed: {}", e),
                        })
                    }
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        title: String,
    }

    fn counting_repair(
        fixed: &'static str,
    ) -> (Arc<AtomicU32>, impl FnMut(String) -> std::pin::Pin<Box<dyn Future<Output = Result<String>> + Send>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let repair = move |_broken: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(fixed.to_string()) })
                as std::pin::Pin<Box<dyn Future<Output = Result<String>> + Send>>
        };
        (calls, repair)
    }

    #[tokio::test]
    async fn test_valid_input_skips_repair() {
        let (calls, repair) = counting_repair("{}");
        let doc: Doc = parse_with_repair(r#"{"title": "Hello"}"#, repair, 2)
            .await
            .unwrap();

        assert_eq!(doc.title, "Hello");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_broken_input_fixed_by_one_repair() {
        let (calls, repair) = counting_repair(r#"{"title": "Fixed"}"#);
        let doc: Doc = parse_with_repair(r#"{"title": broken"#, repair, 2)
            .await
            .unwrap();

        assert_eq!(doc.title, "Fixed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_preserve_diagnostics() {
        let (calls, repair) = counting_repair("still broken {{");
        let result: Result<Doc> = parse_with_repair("not json at all", repair, 2).await;

        match result {
            Err(PipelineError::UnrepairableOutput { raw, reason }) => {
                assert_eq!(raw, "still broken {{");
                assert!(!reason.is_empty());
            }
            other => panic!("expected UnrepairableOutput, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_repaired_text_may_still_carry_fences() {
        let (_, repair) = counting_repair("```json\n{\"title\": \"Fenced\"}\n```");
        let doc: Doc = parse_with_repair("broken", repair, 2).await.unwrap();
        assert_eq!(doc.title, "Fenced");
    }

    #[tokio::test]
    async fn test_failing_repair_call_is_terminal() {
        let repair = |_broken: String| async move {
            Err(PipelineError::Ai("model offline".into()))
        };
        let result: Result<Doc> = parse_with_repair("broken", repair, 5).await;

        match result {
            Err(PipelineError::UnrepairableOutput { reason, .. }) => {
                assert!(reason.contains("repair call failed"));
            }
            other => panic!("expected UnrepairableOutput, got {:?}", other),
        }
    }

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(
            strip_json_wrappers("```json\n{\"a\": 1}\n```"),
            r#"{"a": 1}"#
        );
        assert_eq!(strip_json_wrappers("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn test_strip_surrounding_prose() {
        assert_eq!(
            strip_json_wrappers("Here is the JSON you asked for: {\"a\": 1} Hope that helps!"),
            r#"{"a": 1}"#
        );
    }

    #[test]
    fn test_strip_leaves_clean_json_alone() {
        assert_eq!(strip_json_wrappers(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }
}
