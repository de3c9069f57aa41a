//! Autonomous maintenance loop.
//!
//! A background engine that wakes on a fixed interval, picks the
//! highest-priority page not yet handled this run, and hands it to a
//! [`PageRefresher`]. The engine owns only scheduling and target
//! selection; all content work lives behind the trait.
//!
//! The first tick fires one full interval after start, never
//! immediately. Stopping is cooperative and graceful: a tick already
//! in progress finishes before the loop exits.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::RefreshOutcome;
use crate::types::page::SitemapPage;

/// Interval between maintenance ticks unless overridden.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(180);

/// Prefix for activity-log lines reporting a successful refresh.
///
/// Success lines have the form `SUCCESS|{title}|{url}` so operators
/// (and scrapers of the activity feed) can split them mechanically.
pub const SUCCESS_MARKER: &str = "SUCCESS|";

/// Sink for human-readable activity lines.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// The inventory and log sink a maintenance run operates on.
#[derive(Clone)]
pub struct MaintenanceContext {
    /// Pages eligible for refresh, with opportunity scores
    pub pages: Vec<SitemapPage>,

    /// Activity log sink
    pub log: LogSink,
}

impl MaintenanceContext {
    /// Create a context that logs through `tracing` only.
    pub fn new(pages: Vec<SitemapPage>) -> Self {
        Self {
            pages,
            log: Arc::new(|line| info!(target: "contentops::activity", "{line}")),
        }
    }

    /// Route activity lines to a custom sink.
    pub fn with_log(mut self, log: LogSink) -> Self {
        self.log = log;
        self
    }
}

/// One unit of maintenance work: refresh a single page end to end.
#[async_trait]
pub trait PageRefresher: Send + Sync {
    /// Refresh the page and report what was produced.
    async fn refresh(&self, page: &SitemapPage) -> Result<RefreshOutcome>;
}

struct EngineState {
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// Background engine driving periodic page refreshes.
///
/// # Example
///
/// ```rust,ignore
/// let engine = MaintenanceEngine::new(Arc::new(pipeline))
///     .with_interval(Duration::from_secs(60));
/// engine.start(MaintenanceContext::new(pages));
/// // later
/// engine.stop().await;
/// ```
pub struct MaintenanceEngine {
    refresher: Arc<dyn PageRefresher>,
    interval: Duration,
    state: Mutex<EngineState>,
    context: Arc<RwLock<Arc<MaintenanceContext>>>,
}

impl MaintenanceEngine {
    /// Create an engine with the default tick interval.
    pub fn new(refresher: Arc<dyn PageRefresher>) -> Self {
        Self {
            refresher,
            interval: DEFAULT_TICK_INTERVAL,
            state: Mutex::new(EngineState {
                cancel: None,
                task: None,
            }),
            context: Arc::new(RwLock::new(Arc::new(MaintenanceContext::new(Vec::new())))),
        }
    }

    /// Set the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().cancel.is_some()
    }

    /// Start a run over the given context.
    ///
    /// Each start begins a fresh run: pages handled by a previous run
    /// are eligible again. If a run is already active, the context is
    /// swapped in (as with [`update_context`]) but no second schedule
    /// is created; returns `false` in that case.
    ///
    /// [`update_context`]: MaintenanceEngine::update_context
    pub fn start(&self, context: MaintenanceContext) -> bool {
        let mut state = self.state.lock().unwrap();
        *self.context.write().unwrap() = Arc::new(context);

        if state.cancel.is_some() {
            debug!("maintenance engine already running, context replaced");
            return false;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.refresher),
            self.interval,
            Arc::clone(&self.context),
            cancel.clone(),
        ));

        state.cancel = Some(cancel);
        state.task = Some(task);
        info!(interval = ?self.interval, "maintenance engine started");
        true
    }

    /// Swap the page inventory without restarting the run.
    ///
    /// Takes effect at the next tick; a tick already in progress keeps
    /// the snapshot it started with.
    pub fn update_context(&self, context: MaintenanceContext) {
        *self.context.write().unwrap() = Arc::new(context);
        debug!("maintenance context updated");
    }

    /// Stop the run and wait for any in-progress tick to finish.
    ///
    /// No-op if not running.
    pub async fn stop(&self) {
        let (cancel, task) = {
            let mut state = self.state.lock().unwrap();
            (state.cancel.take(), state.task.take())
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(task) = task {
            // The loop only exits by observing the token, so the join
            // error case is an already-panicked task; nothing to do.
            let _ = task.await;
        }
        info!("maintenance engine stopped");
    }
}

/// Pick the highest-scoring page not yet handled this run.
///
/// Unscored pages rank below any scored page. Ties keep inventory order.
fn pick_target<'a>(pages: &'a [SitemapPage], handled: &HashSet<String>) -> Option<&'a SitemapPage> {
    pages
        .iter()
        .filter(|p| !handled.contains(&p.url))
        .max_by(|a, b| {
            a.opportunity_score
                .unwrap_or(f64::MIN)
                .total_cmp(&b.opportunity_score.unwrap_or(f64::MIN))
        })
}

async fn run_loop(
    refresher: Arc<dyn PageRefresher>,
    interval: Duration,
    context: Arc<RwLock<Arc<MaintenanceContext>>>,
    cancel: CancellationToken,
) {
    let mut handled: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        // Snapshot the Arc so the lock guard never lives across an await.
        let ctx = { Arc::clone(&context.read().unwrap()) };

        let Some(page) = pick_target(&ctx.pages, &handled).cloned() else {
            debug!("maintenance tick found no eligible pages");
            continue;
        };

        debug!(url = %page.url, score = ?page.opportunity_score, "maintenance tick");
        handled.insert(page.url.clone());

        match refresher.refresh(&page).await {
            Ok(outcome) => {
                (ctx.log)(&format!("{SUCCESS_MARKER}{}|{}", outcome.title, page.url));
            }
            Err(e) => {
                warn!(url = %page.url, error = %e, "maintenance refresh failed");
                (ctx.log)(&format!("FAILED|{}|{e}", page.url));
            }
        }

        if cancel.is_cancelled() {
            break;
        }
    }
}
