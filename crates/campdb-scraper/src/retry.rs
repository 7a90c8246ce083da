//! Retry with exponential back-off and jitter for upstream page requests.
//!
//! The policy is an explicit value handed to the client at construction, so
//! callers (and tests) decide how aggressive the retries are.

use std::future::Future;
use std::time::Duration;

use campdb_core::AppConfig;

use crate::error::ScraperError;

/// How many times, and how patiently, a failed request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub backoff_base_ms: u64,
    /// Upper bound applied to every computed delay before jitter.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 2_000,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
            max_delay_ms: 0,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.scraper_max_retries,
            backoff_base_ms: config.scraper_retry_backoff_base_ms,
            max_delay_ms: config.scraper_retry_max_delay_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based), before jitter.
    ///
    /// A server-provided `Retry-After` is honoured when it asks for longer
    /// than the computed back-off, still bounded by `max_delay_ms`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after_secs: Option<u64>) -> u64 {
        let computed = self
            .backoff_base_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(20));
        let requested = retry_after_secs.map_or(0, |s| s.saturating_mul(1_000));
        computed.max(requested).min(self.max_delay_ms)
    }
}

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Network failures, HTTP 429 and 5xx responses are transient. Client
/// errors, malformed bodies and validation failures are returned at once.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(_) | ScraperError::RateLimited { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::Deserialize { .. }
        | ScraperError::Validation { .. }
        | ScraperError::PaginationLimit { .. }
        | ScraperError::InvalidUrl { .. } => false,
    }
}

/// Runs `operation` under `policy`, retrying transient errors.
///
/// With the default policy a request is attempted at most three times,
/// sleeping roughly 2 s and then 4 s (±25 % jitter) between attempts.
/// The last error is returned once retries are exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let retry_after = match &err {
                    ScraperError::RateLimited {
                        retry_after_secs, ..
                    } => Some(*retry_after_secs),
                    _ => None,
                };
                let capped = policy.delay_for(attempt, retry_after);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient upstream error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> ScraperError {
        ScraperError::RateLimited {
            url: "http://upstream.test/search".to_owned(),
            retry_after_secs: 0,
        }
    }

    fn status(code: u16) -> ScraperError {
        ScraperError::UnexpectedStatus {
            status: code,
            url: "http://upstream.test/search".to_owned(),
        }
    }

    #[test]
    fn server_errors_are_retriable() {
        assert!(is_retriable(&status(500)));
        assert!(is_retriable(&status(503)));
        assert!(is_retriable(&rate_limited()));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&status(400)));
        assert!(!is_retriable(&status(404)));
        assert!(!is_retriable(&ScraperError::Validation {
            id: None,
            reason: "missing id".to_owned(),
        }));
    }

    #[test]
    fn default_policy_allows_three_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay_for(1, None), 2_000);
        assert_eq!(policy.delay_for(2, None), 4_000);
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(5, None), 10_000);
        assert_eq!(policy.delay_for(1, Some(3_600)), 10_000);
    }

    #[test]
    fn retry_after_extends_short_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1, Some(5)), 5_000);
    }

    #[tokio::test]
    async fn retries_server_error_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_retries: 2,
            ..RetryPolicy::none()
        };
        let result = retry_with_backoff(policy, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(status(502))
                } else {
                    Ok::<u32, ScraperError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let policy = RetryPolicy {
            max_retries: 2,
            ..RetryPolicy::none()
        };
        let result = retry_with_backoff(policy, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(rate_limited())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScraperError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_client_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(RetryPolicy::default(), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(status(403))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(ScraperError::UnexpectedStatus { status: 403, .. })
        ));
    }
}
