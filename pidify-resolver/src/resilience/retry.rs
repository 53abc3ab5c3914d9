//! Retry with exponential backoff and jitter
//!
//! Transient registry failures (network, throttling) are retried up to the
//! configured budget; a malformed payload fails immediately since the
//! registry will return the same bytes again.

use crate::registries::QueryError;
use pidify_common::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Run a registry operation with the configured retry budget.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g. "orcid search")
/// * `config` - Retry budget and backoff parameters
/// * `operation` - Async closure issuing one registry call per invocation
///
/// # Returns
/// First success, or the final error once the budget is exhausted
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, QueryError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, QueryError>>,
{
    let mut attempt = 0u32;
    let mut backoff_ms = config.initial_backoff_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(operation = operation_name, attempt, "Registry call succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) if err.is_transient() && attempt < config.max_attempts => {
                // Uniform jitter of up to a quarter of the current backoff
                let jitter = rand::thread_rng().gen_range(0..=backoff_ms / 4 + 1);
                let delay = (backoff_ms + jitter).min(config.max_backoff_ms);

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay,
                    error = %err,
                    "Transient registry failure, will retry after backoff"
                );

                tokio::time::sleep(Duration::from_millis(delay)).await;
                backoff_ms = (backoff_ms * 2).min(config.max_backoff_ms);
            }
            Err(err) => {
                tracing::error!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Registry call failed, budget exhausted or not retryable"
                );
                return Err(err);
            }
        }
    }
}
