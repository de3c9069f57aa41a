//! Generic race over competing fetch strategies.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// Default per-strategy timeout when none is set explicitly.
pub const DEFAULT_STRATEGY_TIMEOUT: Duration = Duration::from_secs(8);

/// One alternative way of obtaining the same logical result.
///
/// A strategy owns its future and its own timeout; a timed-out or failed
/// strategy never fails the race on its own.
pub struct RaceStrategy<T> {
    name: String,
    timeout: Duration,
    fut: Pin<Box<dyn Future<Output = FetchResult<T>> + Send>>,
}

impl<T> RaceStrategy<T> {
    /// Create a strategy with the default timeout.
    pub fn new(
        name: impl Into<String>,
        fut: impl Future<Output = FetchResult<T>> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            timeout: DEFAULT_STRATEGY_TIMEOUT,
            fut: Box::pin(fut),
        }
    }

    /// Set the per-strategy timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name of this strategy (used for logging).
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Race all strategies and resolve with the first qualifying success.
///
/// All strategies are launched concurrently as tokio tasks. The first
/// `Ok` to complete wins; every still-pending strategy is then aborted.
/// Cancellation is advisory: a side effect an aborted strategy already
/// caused (e.g. a relay fetched the page) is not undone.
///
/// Fails with [`FetchError::AllStrategiesExhausted`] only when every
/// strategy has failed or timed out. An empty strategy list exhausts
/// immediately.
pub async fn race<T: Send + 'static>(strategies: Vec<RaceStrategy<T>>) -> FetchResult<T> {
    let total = strategies.len();
    let mut set = JoinSet::new();

    for strategy in strategies {
        let name = strategy.name;
        let timeout = strategy.timeout;
        let fut = strategy.fut;
        set.spawn(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => (name, result),
                Err(_) => {
                    let err = FetchError::Timeout {
                        strategy: name.clone(),
                    };
                    (name, Err(err))
                }
            }
        });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((name, Ok(value))) => {
                debug!(strategy = %name, "race won");
                set.abort_all();
                return Ok(value);
            }
            Ok((name, Err(e))) => {
                debug!(strategy = %name, error = %e, "race strategy failed");
            }
            // An aborted or panicked task counts as that strategy failing.
            Err(_) => {}
        }
    }

    Err(FetchError::AllStrategiesExhausted { attempts: total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    async fn succeed_after(ms: u64, value: &'static str) -> FetchResult<&'static str> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(value)
    }

    async fn fail_after(ms: u64) -> FetchResult<&'static str> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Err(FetchError::ServerError { status: 502 })
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let result = race(vec![
            RaceStrategy::new("slow", succeed_after(200, "slow")),
            RaceStrategy::new("fast", succeed_after(10, "fast")),
        ])
        .await
        .unwrap();

        assert_eq!(result, "fast");
    }

    #[tokio::test]
    async fn test_failure_does_not_fail_race() {
        let result = race(vec![
            RaceStrategy::new("broken", fail_after(5)),
            RaceStrategy::new("working", succeed_after(50, "ok")),
        ])
        .await
        .unwrap();

        assert_eq!(result, "ok");
    }

    #[tokio::test]
    async fn test_winner_does_not_wait_for_losers() {
        let start = Instant::now();

        let result = race(vec![
            RaceStrategy::new("glacial", succeed_after(5_000, "late")),
            RaceStrategy::new("quick", succeed_after(20, "early")),
        ])
        .await
        .unwrap();

        assert_eq!(result, "early");
        assert!(
            start.elapsed() < Duration::from_millis(1_000),
            "race waited for the losing strategy: {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_all_fail_exhausts() {
        let result = race(vec![
            RaceStrategy::new("a", fail_after(5)),
            RaceStrategy::new("b", fail_after(10)),
        ])
        .await;

        match result {
            Err(FetchError::AllStrategiesExhausted { attempts }) => assert_eq!(attempts, 2),
            other => panic!("expected AllStrategiesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let result = race(vec![
            RaceStrategy::new("hung", succeed_after(10_000, "never"))
                .with_timeout(Duration::from_millis(20)),
            RaceStrategy::new("dead", fail_after(5)),
        ])
        .await;

        assert!(matches!(
            result,
            Err(FetchError::AllStrategiesExhausted { attempts: 2 })
        ));
    }

    #[tokio::test]
    async fn test_empty_strategy_list() {
        let result: FetchResult<&str> = race(vec![]).await;
        assert!(matches!(
            result,
            Err(FetchError::AllStrategiesExhausted { attempts: 0 })
        ));
    }
}
