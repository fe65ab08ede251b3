//! Rate-limit-aware invocation of gateway calls.
//!
//! Every external call the engine makes goes through [`Invoker::invoke`],
//! which classifies transport failures:
//!
//! - HTTP 401 fails immediately with [`ApiError::InvalidApiKey`].
//! - HTTP 429 with a retry-after at or below the configured ceiling logs
//!   a capacity warning (at most once per configured interval), sleeps
//!   for the indicated duration, and replays the identical call. The
//!   retry count is unbounded; only the per-attempt ceiling check stops
//!   the loop.
//! - HTTP 429 with no retry-after, or one above the ceiling, fails with
//!   [`ApiError::ExhaustedApiKey`].
//! - Anything else propagates unchanged.
//!
//! The wrapper is transparent for idempotent reads. Broadcast goes
//! through the same path on the assumption that the service's
//! retry-after contract prevents duplicate acceptance; see
//! [`ChainGateway::broadcast`](crate::gateway::ChainGateway::broadcast).

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::error::{ApiError, GatewayError};

/// Default ceiling on a server-indicated retry-after.
pub const DEFAULT_MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// Default minimum interval between capacity warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Wraps gateway calls with the retry/classification policy.
///
/// The warning throttle state is owned by the instance — it lives as long
/// as the wallet that created it and resets with the process.
pub struct Invoker {
    max_retry_after: Duration,
    warn_interval: Duration,
    last_warn: Mutex<Option<Instant>>,
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRY_AFTER, DEFAULT_WARN_INTERVAL)
    }
}

impl Invoker {
    pub fn new(max_retry_after: Duration, warn_interval: Duration) -> Self {
        Self {
            max_retry_after,
            warn_interval,
            last_warn: Mutex::new(None),
        }
    }

    /// Run `call`, applying the classification and retry policy.
    ///
    /// `call` must produce a fresh future per attempt with identical
    /// arguments; retries replay it unchanged.
    pub async fn invoke<T, F, Fut>(&self, mut call: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(GatewayError::Http { status: 401, .. }) => {
                    return Err(ApiError::InvalidApiKey);
                }
                Err(GatewayError::Http {
                    status: 429,
                    retry_after,
                }) => {
                    let Some(wait) = retry_after else {
                        return Err(ApiError::ExhaustedApiKey);
                    };
                    if wait > self.max_retry_after {
                        return Err(ApiError::ExhaustedApiKey);
                    }
                    self.note_capacity_exhausted(wait);
                    sleep(wait).await;
                }
                Err(other) => return Err(ApiError::Gateway(other)),
            }
        }
    }

    /// Warn that the key's tier is out of capacity, at most once per
    /// configured interval.
    fn note_capacity_exhausted(&self, wait: Duration) {
        debug!(wait_secs = wait.as_secs(), "gateway rate limited, backing off");
        if self.should_warn() {
            warn!(
                wait_secs = wait.as_secs(),
                "API tier capacity exhausted; waiting before retrying. \
                 Consider upgrading to a higher tier."
            );
        }
    }

    fn should_warn(&self) -> bool {
        let mut last = self.last_warn.lock().expect("warn throttle poisoned");
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.warn_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rate_limited(secs: u64) -> GatewayError {
        GatewayError::Http {
            status: 429,
            retry_after: Some(Duration::from_secs(secs)),
        }
    }

    #[tokio::test]
    async fn success_passes_through() {
        let invoker = Invoker::default();
        let result: Result<u32, _> = invoker.invoke(|| async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn unauthorized_is_fatal_and_not_retried() {
        let invoker = Invoker::default();
        let attempts = AtomicUsize::new(0);
        let result: Result<u32, _> = invoker
            .invoke(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(GatewayError::Http {
                        status: 401,
                        retry_after: None,
                    })
                }
            })
            .await;
        assert_eq!(result.unwrap_err(), ApiError::InvalidApiKey);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_rate_limit_sleeps_once_then_retries() {
        let invoker = Invoker::default();
        let attempts = AtomicUsize::new(0);
        let start = Instant::now();

        let result = invoker
            .invoke(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 { Err(rate_limited(5)) } else { Ok(42u32) }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn over_ceiling_rate_limit_fails_without_sleeping() {
        let invoker = Invoker::default();
        let attempts = AtomicUsize::new(0);
        let start = Instant::now();

        let result: Result<u32, _> = invoker
            .invoke(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited(121)) }
            })
            .await;

        assert_eq!(result.unwrap_err(), ApiError::ExhaustedApiKey);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn missing_retry_after_is_exhausted() {
        let invoker = Invoker::default();
        let result: Result<u32, _> = invoker
            .invoke(|| async {
                Err(GatewayError::Http {
                    status: 429,
                    retry_after: None,
                })
            })
            .await;
        assert_eq!(result.unwrap_err(), ApiError::ExhaustedApiKey);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_rate_limits_accumulate_waits() {
        let invoker = Invoker::default();
        let attempts = AtomicUsize::new(0);
        let start = Instant::now();

        let result = invoker
            .invoke(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    match n {
                        0 => Err(rate_limited(2)),
                        1 => Err(rate_limited(3)),
                        _ => Ok("done"),
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn other_failures_propagate_unchanged() {
        let invoker = Invoker::default();
        let raw = GatewayError::Http {
            status: 500,
            retry_after: None,
        };
        let result: Result<u32, _> = invoker.invoke(|| async { Err(raw.clone()) }).await;
        assert_eq!(result.unwrap_err(), ApiError::Gateway(raw));

        let transport = GatewayError::Transport("connection reset".into());
        let result: Result<u32, _> =
            invoker.invoke(|| async { Err(transport.clone()) }).await;
        assert_eq!(result.unwrap_err(), ApiError::Gateway(transport));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_equal_to_ceiling_is_retried() {
        let invoker = Invoker::default();
        let attempts = AtomicUsize::new(0);

        let result = invoker
            .invoke(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { if n == 0 { Err(rate_limited(120)) } else { Ok(1u8) } }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn warn_throttle_suppresses_within_interval() {
        let invoker = Invoker::default();
        assert!(invoker.should_warn());
        assert!(!invoker.should_warn());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(invoker.should_warn());
    }
}
