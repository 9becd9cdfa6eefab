//! Bounded retry with exponential backoff for transient LLM failures.

use std::future::Future;
use std::time::Duration;

use super::ProviderError;

/// Retry and timeout settings for a single summarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Treated as at least 1.
    pub max_attempts: u32,
    /// Timeout applied to each attempt.
    pub attempt_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(60),
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Compute the backoff before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let backoff = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt));
        backoff.min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.attempt_timeout.as_secs())),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if is_retryable(&e) && attempt + 1 < attempts => {
                    let backoff = self.backoff(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max = attempts,
                        backoff_secs = backoff.as_secs(),
                        reason = classify_error(&e).unwrap_or("transient error"),
                        "summarization attempt failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Check whether a provider error is transient and worth retrying.
///
/// Parse errors are never retried: the model tends to repeat the same
/// malformed output.
pub fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::ParseError(_) | ProviderError::NotConfigured(_) => false,
        ProviderError::Timeout(_) => true,
        ProviderError::ApiError(_) => classify_error(err).is_some(),
    }
}

/// Classifies a provider error into a short, user-friendly message.
///
/// Returns `Some(message)` for transient errors, `None` otherwise.
pub fn classify_error(err: &ProviderError) -> Option<&'static str> {
    match err {
        ProviderError::ApiError(msg) => {
            let msg_lower = msg.to_lowercase();
            if msg_lower.contains("429")
                || msg_lower.contains("rate limit")
                || msg_lower.contains("too many requests")
            {
                Some("Rate limited by API")
            } else if msg_lower.contains("503") || msg_lower.contains("service unavailable") {
                Some("High model load")
            } else if msg_lower.contains("529") || msg_lower.contains("overloaded") {
                Some("API overloaded")
            } else if msg_lower.contains("502") || msg_lower.contains("500") {
                Some("API server error")
            } else if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
                Some("Request timed out")
            } else if msg_lower.contains("connection") {
                Some("Connection error")
            } else {
                None
            }
        }
        ProviderError::Timeout(_) => Some("Request timed out"),
        _ => None,
    }
}
