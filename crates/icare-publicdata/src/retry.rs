//! Retry with exponential back-off and jitter for public-data requests.

use std::future::Future;
use std::time::Duration;

use crate::error::PublicDataError;

const MAX_DELAY_MS: u64 = 60_000;

/// Timeouts, connection failures and 5xx responses are worth another try.
/// API-level and decode errors are not.
pub(crate) fn is_retriable(err: &PublicDataError) -> bool {
    match err {
        PublicDataError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        PublicDataError::Api { .. }
        | PublicDataError::Xml { .. }
        | PublicDataError::InvalidBaseUrl(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors. Attempt `n` sleeps `backoff_base_ms * 2^(n-1)` with ±25 % jitter,
/// capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, PublicDataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PublicDataError>>,
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
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "public data transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn api_error() -> PublicDataError {
        PublicDataError::Api {
            code: "30".to_owned(),
            message: "SERVICE_KEY_IS_NOT_REGISTERED_ERROR".to_owned(),
        }
    }

    #[test]
    fn api_error_is_not_retriable() {
        assert!(!is_retriable(&api_error()));
    }

    #[test]
    fn xml_error_is_not_retriable() {
        let source = quick_xml::de::from_str::<u32>("<a>x</a>").unwrap_err();
        assert!(!is_retriable(&PublicDataError::Xml {
            context: "test".to_owned(),
            source,
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, PublicDataError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_api_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(api_error())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PublicDataError::Api { .. })));
    }

    #[tokio::test]
    async fn retries_connect_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    let err = reqwest::Client::new()
                        .get("http://0.0.0.0:1")
                        .send()
                        .await
                        .unwrap_err();
                    Err::<u32, _>(PublicDataError::Http(err))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                let err = reqwest::Client::new()
                    .get("http://0.0.0.0:1")
                    .send()
                    .await
                    .unwrap_err();
                Err::<u32, _>(PublicDataError::Http(err))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
