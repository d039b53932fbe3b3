use crate::error::{ApiError, Result};
use backoff::{backoff::Backoff, ExponentialBackoff};
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for API calls. `max_attempts` counts the first try, so a
/// value of 1 disables retries.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self::with_attempts(1)
    }

    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            randomization_factor: 0.1,
            multiplier: self.multiplier,
            max_interval: self.max_interval,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

pub async fn retry_with_backoff<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = config.backoff();
    let mut attempts = 0;

    loop {
        attempts += 1;
        debug!(attempt = attempts, "Executing request");

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    debug!(attempts, "Request succeeded after retries");
                }
                return Ok(result);
            }
            Err(err) if err.is_retryable() && attempts < config.max_attempts => {
                // Honour the server's retry-after when it asks for a longer pause.
                let wait = match (&err, backoff.next_backoff()) {
                    (ApiError::RateLimitExceeded { retry_after }, Some(wait)) => {
                        wait.max(Duration::from_secs(*retry_after))
                    }
                    (_, Some(wait)) => wait,
                    (_, None) => return Err(ApiError::Timeout { attempts }),
                };
                warn!(
                    error = %err,
                    attempt = attempts,
                    wait_ms = wait.as_millis(),
                    "Request failed, retrying"
                );
                tokio::time::sleep(wait).await;
            }
            Err(err) => {
                if err.is_retryable() {
                    warn!(attempts, "Max retries exceeded");
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            multiplier: 1.0,
        }
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(&fast(3), || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ApiError::ServerError {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&fast(2), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::ServerError {
                status: 500,
                message: "boom".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ApiError::ServerError { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_policy_makes_a_single_attempt() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&RetryConfig::disabled(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Timeout { attempts: 1 })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn client_errors_are_returned_immediately() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&fast(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::BadRequest {
                message: "message is required".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
