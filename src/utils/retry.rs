//! Retry utilities for resilient operations
//!
//! This module provides the retry loop used around upstream logins. It supports
//! both a fixed interval between attempts and exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first one
    pub max_retries: u32,

    /// Base delay in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,

    /// Multiplier for backoff (1.0 keeps the interval fixed)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration that sleeps the same interval between attempts
    pub fn fixed(max_retries: u32, interval: Duration) -> Self {
        let interval_ms = interval.as_millis() as u64;
        Self {
            max_retries,
            base_delay_ms: interval_ms,
            max_delay_ms: interval_ms,
            backoff_multiplier: 1.0,
        }
    }

    /// Total number of attempts, including the first one
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Calculate delay for a given attempt
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = if attempt == 0 {
            0
        } else {
            let scaled =
                self.base_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);
            (scaled as u64).min(self.max_delay_ms)
        };

        Duration::from_millis(delay_ms)
    }
}

/// Execute an operation with retry logic
///
/// Runs `operation` up to `config.max_retries + 1` times, sleeping between
/// attempts. Returns the first success, or the last error once every attempt
/// has failed.
///
/// # Example
///
/// ```no_run
/// use herald::utils::retry::{with_retry, RetryConfig};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), String> {
/// let config = RetryConfig::fixed(5, Duration::from_secs(10));
/// let token = with_retry(&config, || async { Ok::<_, String>("token".to_string()) }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = config.calculate_delay(attempt);
            debug!(
                attempt = attempt,
                delay_ms = delay.as_millis(),
                "Retrying operation after delay"
            );
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(attempt = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                warn!(
                    attempt = attempt,
                    max_retries = config.max_retries,
                    error = %e,
                    "Operation failed"
                );
                if attempt >= config.max_retries {
                    return Err(e);
                }
            }
        }

        attempt += 1;
    }
}
