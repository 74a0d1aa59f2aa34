//! ============================================================================
//! Retry Executor - Exponential backoff for remote calls
//! ============================================================================
//! Bounded retry wrapper used around every transient-prone remote call:
//! embedding generation, vector search, summarization, and final chat.
//! Delays are async sleeps so one stalled request never blocks others.
//!
//! No jitter is applied. Under bursty concurrent failures this risks
//! synchronized retry storms; left as-is pending requirement confirmation.
//! ============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{RagError, Result};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts (first call included)
    pub max_attempts: u32,
    /// Base delay before the first retry
    pub base_delay_ms: u64,
    /// Delay multiplier applied per failed attempt
    pub backoff_multiplier: f64,
    /// Ceiling on any single delay
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_delay_ms: 10_000,
        }
    }
}

/// Delay before the retry following failed attempt `attempt` (0-based)
pub fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    // Cap the exponent so the f64 power cannot blow up
    let exponent = attempt.min(63) as i32;
    let raw = config.base_delay_ms as f64 * config.backoff_multiplier.powi(exponent);
    let capped = if raw.is_finite() {
        (raw as u64).min(config.max_delay_ms)
    } else {
        config.max_delay_ms
    };
    Duration::from_millis(capped)
}

/// Invoke `op` up to `config.max_attempts` times, sleeping between attempts.
///
/// Non-transient errors (validation, normalization) are returned immediately
/// without consuming the retry budget. Once the budget is spent, the last
/// error is wrapped in `RagError::RetriesExhausted` with the attempt count.
pub async fn with_retries<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..config.max_attempts {
        if attempt > 0 {
            let delay = backoff_delay(attempt - 1, config);
            debug!("Retry attempt {} after {:?} delay", attempt + 1, delay);
            sleep(delay).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                warn!(
                    "Transient error on attempt {}/{}: {}",
                    attempt + 1,
                    config.max_attempts,
                    err
                );
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    let source = last_error.unwrap_or_else(|| RagError::Remote("no attempts made".into()));
    warn!("All {} attempts failed: {}", config.max_attempts, source);
    Err(RagError::RetriesExhausted {
        attempts: config.max_attempts,
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_delay_progression() {
        let config = RetryConfig::default();
        assert_eq!(backoff_delay(0, &config), Duration::from_millis(500));
        assert_eq!(backoff_delay(1, &config), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2, &config), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_delay_capped() {
        let config = RetryConfig::default();
        assert_eq!(backoff_delay(30, &config), Duration::from_millis(10_000));
        // Huge exponents must not overflow
        assert_eq!(backoff_delay(u32::MAX, &config), Duration::from_millis(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retries(&RetryConfig::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(RagError::Remote("flaky".into()))
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_after_exact_attempt_count() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = with_retries(&RetryConfig::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RagError::Remote("down".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(RagError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, RagError::Remote(_)));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_errors_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = with_retries(&RetryConfig::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(RagError::DimensionMismatch {
                    got: 512,
                    expected: 1536,
                })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RagError::DimensionMismatch { .. })));
    }
}
