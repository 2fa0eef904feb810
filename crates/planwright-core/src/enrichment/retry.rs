//! Retry with exponential backoff for enrichment calls

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{EnrichmentContext, EnrichmentFailure, TaskEnricher};
use crate::domain::task::{Guidance, Task};

/// Maximum number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base: Duration::from_millis(backoff_base_ms),
        }
    }

    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_BASE_MS)
    }
}

/// Wraps an enricher and retries transient failures
///
/// Permanent and authentication failures are returned on the first attempt.
pub struct RetryingEnricher<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: TaskEnricher> RetryingEnricher<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl<E: TaskEnricher> TaskEnricher for RetryingEnricher<E> {
    async fn enrich(
        &self,
        task: &Task,
        ctx: &EnrichmentContext,
    ) -> Result<Guidance, EnrichmentFailure> {
        let mut retries = 0;
        loop {
            match self.inner.enrich(task, ctx).await {
                Err(EnrichmentFailure::Transient(reason)) if retries < self.policy.max_retries => {
                    retries += 1;
                    let delay = self.policy.delay_for(retries);
                    warn!(
                        task_id = %task.id,
                        attempt = retries,
                        wait_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Transient enrichment failure, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
