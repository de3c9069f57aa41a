//! Bounded-concurrency batch runner with cooperative cancellation.
//!
//! Runs a worker over a list of [`WorkItem`]s with at most `concurrency`
//! items in flight. Failures and panics are isolated per item; one bad
//! item never takes down its siblings. Two cancellation channels apply:
//! a [`CancellationSet`] for stopping individual keys, and a
//! [`CancellationToken`] for draining the whole batch.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::types::work::{BatchProgress, CancellationSet, WorkItem};

/// Default number of items in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// How a single batch item settled.
#[derive(Debug)]
pub enum ItemOutcome<T> {
    /// Worker returned a value
    Completed { key: String, value: T },

    /// Worker returned an error or panicked
    Failed { key: String, error: PipelineError },

    /// Key was in the cancellation set at dispatch time
    Cancelled { key: String },

    /// Never dispatched because the whole batch was drained
    Skipped { key: String },
}

impl<T> ItemOutcome<T> {
    /// The key of the item this outcome belongs to.
    pub fn key(&self) -> &str {
        match self {
            ItemOutcome::Completed { key, .. }
            | ItemOutcome::Failed { key, .. }
            | ItemOutcome::Cancelled { key }
            | ItemOutcome::Skipped { key } => key,
        }
    }
}

/// Tuning knobs for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl BatchOptions {
    /// Create options with the default concurrency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the in-flight limit. Values below 1 are clamped to 1,
    /// which gives strictly sequential execution.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The in-flight limit.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

/// Run `worker` over `items` with bounded concurrency.
///
/// Returns one [`ItemOutcome`] per input item, in input order, so the
/// result vector always has the same length as `items`. Duplicate keys
/// each run and settle independently.
///
/// `on_progress` fires once per settled item (completed, failed, or
/// individually cancelled) with a monotonically increasing `current`.
/// Items skipped by a global drain do not fire progress.
///
/// Cancellation is cooperative: `cancel_set` is consulted for each
/// item's key at dispatch time, and `cancel` stops further dispatch
/// while letting in-flight items finish.
pub async fn run_batch<T, W, Fut, P>(
    items: Vec<WorkItem>,
    worker: W,
    options: BatchOptions,
    mut on_progress: P,
    cancel_set: &CancellationSet,
    cancel: &CancellationToken,
) -> Vec<ItemOutcome<T>>
where
    T: Send + 'static,
    W: Fn(WorkItem) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    P: FnMut(BatchProgress),
{
    let total = items.len();
    let worker = Arc::new(worker);

    debug!(total, concurrency = options.concurrency, "starting batch run");

    let mut queue: VecDeque<(usize, WorkItem)> = items.into_iter().enumerate().collect();
    let mut outcomes: Vec<Option<ItemOutcome<T>>> = Vec::with_capacity(total);
    outcomes.resize_with(total, || None);

    let mut in_flight: JoinSet<(usize, String, Result<T>)> = JoinSet::new();
    let mut settled = 0usize;

    loop {
        // Dispatch until the in-flight window is full or dispatch stops.
        while in_flight.len() < options.concurrency && !cancel.is_cancelled() {
            let Some((idx, item)) = queue.pop_front() else {
                break;
            };

            if cancel_set.is_cancelled(&item.key) {
                debug!(key = %item.key, "item cancelled before dispatch");
                outcomes[idx] = Some(ItemOutcome::Cancelled { key: item.key });
                settled += 1;
                on_progress(BatchProgress {
                    current: settled,
                    total,
                });
                continue;
            }

            let worker = Arc::clone(&worker);
            in_flight.spawn(async move {
                let key = item.key.clone();
                let result = match std::panic::AssertUnwindSafe(worker(item))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result,
                    Err(panic) => Err(PipelineError::WorkerPanic {
                        message: panic_message(panic),
                    }),
                };
                (idx, key, result)
            });
        }

        if in_flight.is_empty() {
            break;
        }

        if let Some(joined) = in_flight.join_next().await {
            // Panics are caught inside the task, so join errors can only
            // be task aborts, which this runner never issues.
            let Ok((idx, key, result)) = joined else {
                continue;
            };

            let outcome = match result {
                Ok(value) => ItemOutcome::Completed { key, value },
                Err(error) => {
                    warn!(key = %key, %error, "batch item failed");
                    ItemOutcome::Failed { key, error }
                }
            };
            outcomes[idx] = Some(outcome);
            settled += 1;
            on_progress(BatchProgress {
                current: settled,
                total,
            });
        }
    }

    // Anything still queued was drained by a global cancellation.
    for (idx, item) in queue {
        outcomes[idx] = Some(ItemOutcome::Skipped { key: item.key });
    }

    debug!(settled, total, "batch run finished");

    outcomes
        .into_iter()
        .map(|o| o.unwrap_or_else(|| unreachable!("every slot settles or drains")))
        .collect()
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
