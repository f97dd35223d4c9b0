//! HTTP retry for calls to the forecasting service.
//!
//! Connection failures, timeouts, HTTP 429 and HTTP 5xx are retried with
//! exponential backoff. Other 4xx statuses are permanent. When the last
//! attempt still fails with an error status, the service's `{"error": ...}`
//! message is surfaced as is.

use std::time::Duration;

use crate::PredictionError;
use crate::models::error_message;

/// How many times, and how patiently, to retry a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// Sends the request built by `build_request` and parses a JSON body.
///
/// `build_request` is called once per attempt since request builders are
/// consumed by sending. `fallback` names the operation in error messages
/// when the service sends no `error` text.
///
/// # Errors
///
/// Returns [`PredictionError`] if the request fails after all retries, the
/// service answers with a permanent error status, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    policy: RetryPolicy,
    fallback: &str,
    build_request: F,
) -> Result<serde_json::Value, PredictionError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(policy, fallback, &build_request).await?;
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    policy: RetryPolicy,
    fallback: &str,
    build_request: &F,
) -> Result<reqwest::Response, PredictionError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                log::error!("{fallback}: {e}");
                return Err(PredictionError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let retryable =
                    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                if retryable && attempt < max_retries {
                    log::warn!("  HTTP {status}");
                    attempt += 1;
                    continue;
                }

                let body = response.text().await.unwrap_or_default();
                let message = error_message(status.as_u16(), &body, fallback);
                log::error!("{fallback}: HTTP {status}: {message}");
                return Err(PredictionError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
        }
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
pub(crate) fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double() {
        let policy = RetryPolicy {
            max_retries: 4,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
    }

    #[test]
    fn none_never_waits() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.delay(1), Duration::ZERO);
    }
}
