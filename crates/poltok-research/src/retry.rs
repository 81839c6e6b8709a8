//! Retry with exponential back-off and jitter for the Research API client.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors. Non-transient errors (auth rejections, unknown
//! accounts, malformed responses) are returned immediately without retry.

use std::future::Future;
use std::time::Duration;

use crate::error::ResearchError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`ResearchError::RateLimited`]: the server asked us to back off.
/// - [`ResearchError::ServerError`]: HTTP 5xx, transient on their side.
/// - [`ResearchError::Http`]: network-level failure (timeout, reset).
/// - `internal_error` in the response envelope, which the API documents as
///   safe to retry.
///
/// **Not retriable (hard stop):**
/// - [`ResearchError::Auth`]: a bad token fails every subsequent request.
/// - [`ResearchError::NotFound`]: retrying returns the same result.
/// - [`ResearchError::Deserialize`]: malformed response; retrying won't fix it.
/// - [`ResearchError::PaginationLimit`]: loop guard, not a transient error.
pub(crate) fn is_retriable(err: &ResearchError) -> bool {
    match err {
        ResearchError::RateLimited { .. }
        | ResearchError::ServerError { .. }
        | ResearchError::Http(_) => true,
        ResearchError::Api { code, .. } => code == "internal_error",
        ResearchError::Auth { .. }
        | ResearchError::NotFound { .. }
        | ResearchError::Deserialize { .. }
        | ResearchError::UnexpectedStatus { .. }
        | ResearchError::PaginationLimit { .. } => false,
    }
}

/// Back-off for `attempt` (1-based), jittered into the 75%..125% band.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn jittered_backoff_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let capped = backoff_base_ms
        .saturating_mul(1u64 << (attempt - 1).min(10))
        .min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt    |
/// |---------|------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter |
/// | 3       | 1 000 ms × 2² ± 25 % jitter |
///
/// Delay is capped at 60 s. A rate-limit error carrying a `Retry-After`
/// hint sleeps for the hinted duration instead of the computed back-off.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ResearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ResearchError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = match &err {
                    ResearchError::RateLimited { retry_after_secs } if *retry_after_secs > 0 => {
                        retry_after_secs.saturating_mul(1_000).min(MAX_DELAY_MS)
                    }
                    _ => jittered_backoff_ms(backoff_base_ms, attempt),
                };
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient Research API error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> ResearchError {
        ResearchError::ServerError {
            status: 503,
            url: "https://open.tiktokapis.com/v2/research/user/info/".to_owned(),
        }
    }

    fn deserialize_err() -> ResearchError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        ResearchError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn rate_limited_is_retriable() {
        assert!(is_retriable(&ResearchError::RateLimited {
            retry_after_secs: 30
        }));
    }

    #[test]
    fn server_error_is_retriable() {
        assert!(is_retriable(&server_error()));
    }

    #[test]
    fn envelope_internal_error_is_retriable() {
        assert!(is_retriable(&ResearchError::Api {
            code: "internal_error".to_owned(),
            message: "something went wrong".to_owned(),
        }));
    }

    #[test]
    fn other_envelope_errors_are_not_retriable() {
        assert!(!is_retriable(&ResearchError::Api {
            code: "invalid_count".to_owned(),
            message: "max_count out of range".to_owned(),
        }));
    }

    #[test]
    fn auth_error_is_not_retriable() {
        assert!(!is_retriable(&ResearchError::Auth {
            status: 401,
            message: "token expired".to_owned(),
        }));
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&ResearchError::NotFound {
            username: "ghost".to_owned(),
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn backoff_doubles_per_attempt_within_the_jitter_band() {
        let first = jittered_backoff_ms(1_000, 1);
        assert!((750..=1_250).contains(&first), "attempt 1: {first}");

        let second = jittered_backoff_ms(1_000, 2);
        assert!((1_500..=2_500).contains(&second), "attempt 2: {second}");
    }

    #[test]
    fn backoff_is_capped() {
        // 1_000 ms * 2^9 would be 512 s; the cap holds it at 60 s plus jitter.
        let delay = jittered_backoff_ms(1_000, 10);
        assert!(delay <= 75_000, "capped delay with jitter: {delay}");
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ResearchError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(server_error())
                } else {
                    Ok::<u32, ResearchError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99, "should succeed after retries");
        assert_eq!(
            calls.load(Ordering::SeqCst),
            3,
            "should have been called 3 times (2 failures + 1 success)"
        );
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(server_error())
            }
        })
        .await;
        // max_retries=2 means 3 total attempts.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ResearchError::ServerError { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_auth_error() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ResearchError::Auth {
                    status: 401,
                    message: "token expired".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "auth errors must not be retried"
        );
        assert!(matches!(result, Err(ResearchError::Auth { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ResearchError::NotFound {
                    username: "ghost".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ResearchError::NotFound { .. })));
    }
}
