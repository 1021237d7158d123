//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use aw_config::RetryConfig;
use orion_error::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, CoreReason, CoreResult, FailureKind};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub max_backoff: Option<Duration>,
    /// Processing failures of these kinds are rethrown without retrying.
    pub non_retriable: Vec<FailureKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            backoff: Duration::from_secs(5),
            max_backoff: None,
            non_retriable: vec![FailureKind::MalformedReport],
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            backoff: cfg.backoff.as_duration(),
            max_backoff: cfg.max_backoff.map(|d| d.as_duration()),
            ..Self::default()
        }
    }
}

impl RetryPolicy {
    pub fn with_non_retriable(mut self, kinds: Vec<FailureKind>) -> Self {
        self.non_retriable = kinds;
        self
    }

    /// Sleep after failed attempt `attempt` (1-based): `backoff * 2^attempt`,
    /// capped by `max_backoff` when set.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let delay = 2u32
            .checked_pow(attempt)
            .and_then(|factor| self.backoff.checked_mul(factor))
            .unwrap_or(Duration::MAX);
        match self.max_backoff {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    fn is_retriable(&self, err: &CoreError) -> bool {
        match err.reason().failure_kind() {
            Some(kind) => !self.non_retriable.contains(&kind),
            None => false,
        }
    }
}

/// Run `task` up to `policy.max_attempts` times.
///
/// `task` receives the 1-based attempt number. Errors that are not
/// processing failures, and processing failures listed as non-retriable,
/// are returned immediately. Exhaustion yields a `Processing(Exhausted)`
/// error wrapping the last failure. Cancelling `cancel` while waiting
/// between attempts returns `Interrupted`.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    description: &str,
    cancel: &CancellationToken,
    mut task: F,
) -> CoreResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(CoreError::from(CoreReason::Interrupted)
                .with_detail(format!("{description}: cancelled")));
        }

        let err = match task(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !policy.is_retriable(&err) {
            return Err(err);
        }

        if attempt >= max_attempts {
            return Err(CoreError::from(CoreReason::Processing(FailureKind::Exhausted))
                .with_detail(format!("failed to {description} after all retries. last failure: {err}")));
        }

        let delay = policy.delay_after(attempt);
        log::warn!(
            "attempt {attempt}/{max_attempts} to {description} failed: {err}; retrying in {delay:?}"
        );
        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(CoreError::from(CoreReason::Interrupted)
                    .with_detail(format!("{description}: cancelled during retry backoff")));
            }
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
