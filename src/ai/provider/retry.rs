//! Retrying Client
//!
//! Wraps any [`AnalysisClient`] with a per-attempt timeout and
//! exponential backoff with random jitter. Rate limits honor the provider's
//! suggested delay when one can be read from the error.
//!
//! Auth failures and rejected requests are returned on the first attempt.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{AnalysisClient, CompletionRequest, SharedClient};
use crate::ai::timeout::with_timeout;
use crate::constants::{network, retry as retry_constants};
use crate::types::{ErrorCategory, ErrorClassifier, Result};

/// Retry behaviour for one completion
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per completion, including the first
    pub max_attempts: u8,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Cap on backoff delays
    pub max_delay: Duration,
    pub backoff_factor: f32,
    /// Cap on a provider-suggested rate limit delay
    pub max_retry_after: Duration,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            max_delay: Duration::from_secs(retry_constants::MAX_DELAY_SECS),
            backoff_factor: retry_constants::BACKOFF_FACTOR,
            max_retry_after: Duration::from_secs(retry_constants::MAX_RETRY_AFTER_SECS),
            attempt_timeout: Duration::from_secs(network::DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Client decorator adding timeouts and retries
pub struct RetryingClient {
    inner: SharedClient,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: SharedClient, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl AnalysisClient for RetryingClient {
    async fn analyze(&self, request: &CompletionRequest) -> Result<String> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut current_delay = self.policy.base_delay;
        let mut attempt: u8 = 0;

        loop {
            attempt += 1;

            let result = with_timeout(
                self.policy.attempt_timeout,
                self.inner.analyze(request),
                "completion",
            )
            .await;

            let err = match result {
                Ok(text) => {
                    if attempt > 1 {
                        debug!(provider = self.inner.name(), attempt, "Completion recovered");
                    }
                    return Ok(text);
                }
                Err(e) => e,
            };

            let classified = ErrorClassifier::classify_review_error(&err, self.inner.name());

            if !classified.category.is_retryable() || attempt >= max_attempts {
                warn!(
                    provider = self.inner.name(),
                    attempt,
                    category = %classified.category,
                    "Completion failed: {}",
                    err
                );
                return Err(err);
            }

            let delay = if classified.category == ErrorCategory::RateLimit {
                parse_rate_limit_delay(&classified.message)
                    .or(classified.retry_after)
                    .unwrap_or(current_delay)
                    .min(self.policy.max_retry_after)
            } else {
                current_delay
            };
            let delay = delay + random_jitter(delay);

            debug!(
                provider = self.inner.name(),
                attempt,
                category = %classified.category,
                delay_ms = delay.as_millis() as u64,
                "Retrying completion"
            );

            sleep(delay).await;
            current_delay = calculate_backoff(
                current_delay,
                self.policy.backoff_factor,
                self.policy.max_delay,
            );
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

/// Parse rate limit delay from error message
///
/// Extracts retry-after seconds from common rate limit error formats.
fn parse_rate_limit_delay(message: &str) -> Option<Duration> {
    let lower = message.to_lowercase();

    // "retry after N seconds" or "retry-after: N"
    if let Some(idx) = lower.find("retry") {
        let after_retry = &lower[idx..];
        for word in after_retry.split_whitespace() {
            if let Ok(secs) = word.parse::<u64>() {
                return Some(Duration::from_secs(secs));
            }
        }
    }

    // "wait N seconds" or "in N seconds"
    for pattern in &["wait ", "in "] {
        if let Some(idx) = lower.find(pattern) {
            let after_pattern = &lower[idx + pattern.len()..];
            if let Some(secs) = after_pattern
                .split_whitespace()
                .next()
                .and_then(|w| w.parse::<u64>().ok())
            {
                return Some(Duration::from_secs(secs));
            }
        }
    }

    None
}

/// Random jitter up to a quarter of the base delay
fn random_jitter(base_delay: Duration) -> Duration {
    let max_jitter_ms = (base_delay.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    let jitter_ms = rand::rng().random_range(0..max_jitter_ms);
    Duration::from_millis(jitter_ms)
}

/// Exponential backoff with cap
fn calculate_backoff(current: Duration, factor: f32, max: Duration) -> Duration {
    let next = Duration::from_secs_f32(current.as_secs_f32() * factor);
    std::cmp::min(next, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReviewError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockClient {
        calls: AtomicU32,
        failures: u32,
        message: &'static str,
        stall: Option<Duration>,
    }

    impl MockClient {
        fn failing_then_success(failures: u32, message: &'static str) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                message,
                stall: None,
            }
        }
    }

    #[async_trait]
    impl AnalysisClient for MockClient {
        async fn analyze(&self, _request: &CompletionRequest) -> Result<String> {
            let count = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(stall) = self.stall
                && count < self.failures
            {
                sleep(stall).await;
            }
            if count < self.failures {
                return Err(ReviewError::LlmApi(self.message.to_string()));
            }
            Ok(format!("answer after {} failures", count))
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    fn fast_policy(max_attempts: u8) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            max_retry_after: Duration::from_millis(5),
            attempt_timeout: Duration::from_millis(200),
            ..Default::default()
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("sys", "user", 100, 0.5)
    }

    #[tokio::test]
    async fn test_recovers_from_transient_errors() {
        let mock = Arc::new(MockClient::failing_then_success(2, "mock transient error"));
        let client = RetryingClient::new(mock.clone(), fast_policy(3));

        let text = client.analyze(&request()).await.unwrap();
        assert_eq!(text, "answer after 2 failures");
        assert_eq!(mock.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mock = Arc::new(MockClient::failing_then_success(10, "mock transient error"));
        let client = RetryingClient::new(mock.clone(), fast_policy(3));

        assert!(client.analyze(&request()).await.is_err());
        assert_eq!(mock.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        let mock = Arc::new(MockClient::failing_then_success(5, "401 unauthorized"));
        let client = RetryingClient::new(mock.clone(), fast_policy(3));

        assert!(client.analyze(&request()).await.is_err());
        assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_delay_is_capped() {
        let mock = Arc::new(MockClient::failing_then_success(
            1,
            "rate limit reached, retry after 60 seconds",
        ));
        let client = RetryingClient::new(mock.clone(), fast_policy(2));

        let started = std::time::Instant::now();
        assert!(client.analyze(&request()).await.is_ok());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_stalled_attempt_times_out_and_retries() {
        let mock = Arc::new(MockClient {
            calls: AtomicU32::new(0),
            failures: 1,
            message: "unused",
            stall: Some(Duration::from_secs(5)),
        });
        let client = RetryingClient::new(mock.clone(), fast_policy(2));

        let text = client.analyze(&request()).await.unwrap();
        assert_eq!(text, "answer after 1 failures");
        assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parse_rate_limit_delay() {
        assert_eq!(
            parse_rate_limit_delay("Please retry after 30 seconds"),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            parse_rate_limit_delay("Wait 10 seconds before retrying"),
            Some(Duration::from_secs(10))
        );
        assert_eq!(parse_rate_limit_delay("Rate limit exceeded"), None);
    }

    #[test]
    fn test_calculate_backoff_caps() {
        let max = Duration::from_secs(30);
        assert_eq!(
            calculate_backoff(Duration::from_secs(1), 2.0, max),
            Duration::from_secs(2)
        );
        assert_eq!(calculate_backoff(Duration::from_secs(20), 2.0, max), max);
    }

    #[test]
    fn test_random_jitter_bounds() {
        let base = Duration::from_millis(400);
        for _ in 0..50 {
            assert!(random_jitter(base) < Duration::from_millis(100));
        }
        assert_eq!(random_jitter(Duration::from_millis(3)), Duration::ZERO);
    }
}
