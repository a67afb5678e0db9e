//! Retry configuration, delay calculation, and the retrying backend decorator.
//!
//! Provides [`RetryConfig`] for controlling retry behaviour and
//! [`RetryingBackend`], which wraps a [`TranslationBackend`] so that model
//! loads are retried on transient errors. The model cache only ever sees the
//! final outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::traits::{TranslationBackend, TranslationModel};
use crate::telemetry;
use crate::{Result, TolkError};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff capped at `max_delay`:
///
/// ```rust
/// # use tolk::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay for a given attempt number (0-indexed).
    ///
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Delay to use, preferring a backend `retry_after` hint when present.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

/// Execute an async operation with retry logic.
///
/// Retries on transient errors (as classified by [`TolkError::is_transient()`])
/// up to `config.max_attempts`. Permanent errors are returned immediately.
pub(crate) async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    backend: &str,
    operation: &str,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt + 1 < attempts {
                    metrics::counter!(telemetry::RETRIES_TOTAL,
                        "backend" => backend.to_owned(),
                        "operation" => operation.to_owned(),
                    )
                    .increment(1);
                    let delay = config.effective_delay(attempt, e.retry_after());
                    warn!(
                        backend,
                        operation,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        TolkError::Configuration(format!("{operation} was never attempted"))
    }))
}

/// Decorator that wraps a [`TranslationBackend`] with retry logic on `load`.
///
/// Loaded models are returned untouched; translation calls are not retried.
pub struct RetryingBackend {
    inner: Arc<dyn TranslationBackend>,
    config: RetryConfig,
}

impl RetryingBackend {
    /// Wrap a backend with retry logic.
    pub fn new(inner: Arc<dyn TranslationBackend>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl TranslationBackend for RetryingBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn load(&self, model_id: &str) -> Result<Box<dyn TranslationModel>> {
        with_retry(&self.config, self.inner.name(), "load", || {
            self.inner.load(model_id)
        })
        .await
    }
}
