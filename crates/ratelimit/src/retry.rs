use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::backoff::ExponentialBackoff;
use crate::error::RequestError;

/// Lets the executor tell throttling apart from every other failure
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first call; at most `max_retries + 1` calls are made
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(300),
        }
    }
}

/// Runs a request, retrying only when the error reports rate limiting
#[derive(Debug, Clone, Default)]
pub struct RetryableExecutor {
    config: RetryConfig,
}

impl RetryableExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn execute<T, E, F, Fut>(
        &self,
        operation: &str,
        mut action: F,
    ) -> Result<T, RequestError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal + Display,
    {
        let mut backoff = ExponentialBackoff::new(self.config.initial_delay, self.config.max_delay);

        loop {
            let attempt = backoff.current_attempt() + 1;
            debug!(operation, attempt, "executing request");

            match action().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "request succeeded after rate limiting");
                    } else {
                        debug!(operation, "request succeeded");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_rate_limited() => {
                    if backoff.current_attempt() >= self.config.max_retries {
                        error!(
                            operation,
                            attempt,
                            max_retries = self.config.max_retries,
                            "retry budget exhausted"
                        );
                        return Err(RequestError::MaxRetriesExceeded {
                            operation: operation.to_string(),
                            max_retries: self.config.max_retries,
                            last_error: err,
                        });
                    }

                    let delay = backoff.next_delay();
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    error!(operation, attempt, error = %err, "request failed");
                    return Err(RequestError::Failed {
                        operation: operation.to_string(),
                        source: err,
                    });
                }
            }
        }
    }
}
