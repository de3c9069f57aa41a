//! Exponential-backoff retry for single async operations.
//!
//! Every flaky external call in the pipeline (AI providers, WordPress
//! REST) goes through this wrapper. Failures are swallowed until the
//! attempt budget is spent, then the last failure surfaces as
//! [`RetryError::OperationFailed`]. Cancellation observed during a
//! backoff wait stops immediately and surfaces [`RetryError::Cancelled`].

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::RetryError;

/// Governs retry behavior for a single operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least 1)
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub base_delay: Duration,

    /// Multiplier applied to the delay after each failed attempt (>= 1.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget (clamped to at least 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the backoff multiplier (clamped to at least 1.0).
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Delay before attempt `failed + 1`, given `failed` completed failures:
    /// `base_delay * multiplier^(failed - 1)`.
    pub fn delay_after(&self, failed: u32) -> Duration {
        let exp = failed.saturating_sub(1);
        self.base_delay
            .mul_f64(self.backoff_multiplier.powi(exp as i32))
    }
}

/// Retry `op` according to `policy`.
pub async fn with_retry<T, E, F, Fut>(op: F, policy: &RetryPolicy) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let never = CancellationToken::new();
    with_retry_cancellable(op, policy, &never).await
}

/// Retry `op` according to `policy`, honoring cooperative cancellation.
///
/// The token is checked before each attempt and polled during backoff
/// waits; cancellation surfaces as [`RetryError::Cancelled`], never as
/// an operation failure.
pub async fn with_retry_cancellable<T, E, F, Fut>(
    mut op: F,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let budget = policy.max_attempts.max(1);
    let mut failed = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                failed += 1;
                if failed >= budget {
                    return Err(RetryError::OperationFailed {
                        attempts: failed,
                        source: e,
                    });
                }

                let delay = policy.delay_after(failed);
                warn!(
                    attempt = failed,
                    budget,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, backing off"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
