//! Integration tests for the full content pipeline.
//!
//! These tests verify the end-to-end flow without any network:
//! 1. Generate a draft from canned model output
//! 2. Repair malformed JSON via the mock's repair path
//! 3. Normalize, link, and verify the draft
//! 4. Publish through a mock publisher
//! 5. Drive the same pipeline from a batch run and the maintenance engine

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use contentops::testing::{MockAi, MockPublisher};
use contentops::{
    run_batch, BatchOptions, CancellationSet, ItemOutcome, MaintenanceContext, MaintenanceEngine,
    PipelineError, PublishStatus, RefreshPipeline, RetryPolicy, SitemapPage, WorkItem,
    SUCCESS_MARKER,
};

const BODY: &str = "<p>word </p>";

/// A draft body comfortably inside the default word bounds.
fn long_body() -> String {
    BODY.repeat(800)
}

fn draft_json(title: &str) -> String {
    serde_json::json!({
        "title": title,
        "content": long_body(),
        "metaDescription": "A complete guide.",
        "semanticKeywords": ["grind size", "burr"],
    })
    .to_string()
}

fn page(url: &str) -> SitemapPage {
    SitemapPage::new(url).with_crawled_content("existing article text about coffee grinders")
}

fn pipeline(ai: Arc<MockAi>, publisher: Arc<MockPublisher>) -> RefreshPipeline<MockAi, MockPublisher> {
    RefreshPipeline::new(ai, publisher)
        .with_retry_policy(
            RetryPolicy::new()
                .with_max_attempts(3)
                .with_base_delay(Duration::from_millis(1)),
        )
}

#[tokio::test]
async fn test_refresh_page_end_to_end() {
    let ai = Arc::new(MockAi::new().with_response(
        "refresh_article",
        format!("```json\n{}\n```", draft_json("Best Coffee Grinders")),
    ));
    let publisher = Arc::new(MockPublisher::new());

    let outcome = pipeline(ai.clone(), publisher.clone())
        .refresh_page(&page("https://example.com/best-coffee-grinders"))
        .await
        .unwrap();

    assert_eq!(outcome.title, "Best Coffee Grinders");
    assert_eq!(outcome.word_count, 800);
    assert_eq!(
        outcome.link.as_deref(),
        Some("https://example.com/best-coffee-grinders")
    );

    // The crawled content (not a fresh fetch) grounded the prompt.
    let calls = ai.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].grounding_len > 0);

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0.slug, "best-coffee-grinders");
    assert_eq!(published[0].1, PublishStatus::Draft);
}

#[tokio::test]
async fn test_malformed_json_is_repaired_before_publish() {
    let ai = Arc::new(
        MockAi::new()
            .with_response("refresh_article", "{ this is not json")
            .with_response("json_repair", draft_json("Repaired Title")),
    );
    let publisher = Arc::new(MockPublisher::new());

    let outcome = pipeline(ai.clone(), publisher.clone())
        .refresh_page(&page("https://example.com/a"))
        .await
        .unwrap();

    assert_eq!(outcome.title, "Repaired Title");
    assert_eq!(ai.call_count("json_repair"), 1);
    assert_eq!(publisher.published().len(), 1);
}

#[tokio::test]
async fn test_unrepairable_output_fails_without_publishing() {
    let ai = Arc::new(
        MockAi::new()
            .with_response("refresh_article", "not json at all")
            .with_response("json_repair", "still not json")
            .with_response("json_repair", "nope"),
    );
    let publisher = Arc::new(MockPublisher::new());

    let err = pipeline(ai, publisher.clone())
        .refresh_page(&page("https://example.com/a"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UnrepairableOutput { .. }));
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn test_transient_ai_failures_are_retried() {
    let ai = Arc::new(
        MockAi::new()
            .failing_times("refresh_article", 2)
            .with_response("refresh_article", draft_json("Eventually")),
    );
    let publisher = Arc::new(MockPublisher::new());

    let outcome = pipeline(ai.clone(), publisher)
        .refresh_page(&page("https://example.com/a"))
        .await
        .unwrap();

    assert_eq!(outcome.title, "Eventually");
    assert_eq!(ai.call_count("refresh_article"), 3);
}

#[tokio::test]
async fn test_short_draft_is_rejected() {
    let ai = Arc::new(MockAi::new().with_response(
        "refresh_article",
        r#"{"title": "Too Short", "content": "<p>only a few words here</p>"}"#,
    ));
    let publisher = Arc::new(MockPublisher::new());

    let err = pipeline(ai, publisher.clone())
        .refresh_page(&page("https://example.com/a"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::ContentTooShort { word_count: 5, .. }
    ));
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn test_link_candidates_resolve_against_pool() {
    let body = format!("{} <p>See [LINK_CANDIDATE: espresso] too.</p>", long_body());
    let ai = Arc::new(MockAi::new().with_response(
        "write_article",
        serde_json::json!({"title": "Grinder Guide", "content": body}).to_string(),
    ));
    let publisher = Arc::new(MockPublisher::new());

    let pool = vec![SitemapPage::new("https://example.com/espresso-basics")
        .with_title("Espresso Basics")];

    pipeline(ai, publisher.clone())
        .with_link_pool(pool)
        .draft_article("grinder guide")
        .await
        .unwrap();

    let published = publisher.published();
    assert!(published[0]
        .0
        .content
        .contains(r#"<a href="https://example.com/espresso-basics">espresso</a>"#));
}

#[tokio::test]
async fn test_batch_run_over_pipeline_reports_progress() {
    let ai = Arc::new(
        MockAi::new()
            .with_response("write_article", draft_json("First"))
            .with_response("write_article", "unfixable")
            .with_response("write_article", draft_json("Third")),
    );
    let publisher = Arc::new(MockPublisher::new());

    let pipeline = Arc::new(
        RefreshPipeline::new(Arc::clone(&ai), publisher.clone())
            .with_retry_policy(RetryPolicy::new().with_base_delay(Duration::from_millis(1))),
    );

    let items = vec![
        WorkItem::new("keyword one"),
        WorkItem::new("keyword two"),
        WorkItem::new("keyword three"),
    ];

    let progress: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let progress_log = Arc::clone(&progress);

    let worker_pipeline = Arc::clone(&pipeline);
    let outcomes = run_batch(
        items,
        move |item: WorkItem| {
            let pipeline = Arc::clone(&worker_pipeline);
            async move { pipeline.draft_article(&item.key).await }
        },
        BatchOptions::new().with_concurrency(1),
        move |p| progress_log.lock().unwrap().push(p.current),
        &CancellationSet::new(),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(outcomes.len(), 3);
    assert!(matches!(&outcomes[0], ItemOutcome::Completed { .. }));
    assert!(matches!(&outcomes[1], ItemOutcome::Failed { .. }));
    assert!(matches!(&outcomes[2], ItemOutcome::Completed { .. }));
    assert_eq!(*progress.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(publisher.published().len(), 2);
}

#[tokio::test]
async fn test_maintenance_engine_drives_pipeline() {
    let ai = Arc::new(
        MockAi::new().with_response("refresh_article", draft_json("Refreshed Guide")),
    );
    let publisher = Arc::new(MockPublisher::new());
    let pipeline = Arc::new(pipeline(ai, publisher.clone()));

    let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = Arc::clone(&lines);

    let pages = vec![
        page("https://example.com/stale-guide").with_opportunity_score(8.5),
        page("https://example.com/fresh-guide").with_opportunity_score(0.5),
    ];
    let context = MaintenanceContext::new(pages).with_log(Arc::new(move |line| {
        sink_lines.lock().unwrap().push(line.to_string())
    }));

    let engine = MaintenanceEngine::new(pipeline).with_interval(Duration::from_millis(20));
    engine.start(context);
    tokio::time::sleep(Duration::from_millis(35)).await;
    engine.stop().await;

    let lines = lines.lock().unwrap().clone();
    assert!(!lines.is_empty());
    assert!(lines[0].starts_with(SUCCESS_MARKER));
    assert!(lines[0].contains("Refreshed Guide"));
    assert!(lines[0].ends_with("https://example.com/stale-guide"));

    assert_eq!(publisher.published().len(), 1);
}
