//! Caller-level retry with exponential backoff
//!
//! The pipeline performs each external call at most once per request. Callers
//! that want another attempt wrap `process()` in a [`RetryPolicy`], which
//! re-issues the whole request only when retrieval was unavailable.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::aggregator::AggregateReport;
use crate::errors::ErrorKind;

/// Default attempts, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const BASE_DELAY_MS: u64 = 500;

const MAX_DELAY_MS: u64 = 8000;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Create new policy; `max_attempts` of 0 is treated as 1
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::new(1)
    }

    /// Override the base delay
    pub fn with_base_delay(mut self, base: Duration) -> Self {
        self.base_delay_ms = base.as_millis() as u64;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.enable_jitter = false;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether a finished report is worth another attempt
    pub fn should_retry(report: &AggregateReport) -> bool {
        report.failure_kind == Some(ErrorKind::RetrievalUnavailable)
    }

    /// Run `attempt` until it yields a report that should not be retried or
    /// attempts run out; returns the last report
    pub async fn run<F, Fut>(&self, mut attempt: F) -> AggregateReport
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AggregateReport>,
    {
        let mut tries = 1;

        loop {
            let report = attempt().await;

            if !Self::should_retry(&report) || tries >= self.max_attempts {
                return report;
            }

            let delay = self.calculate_delay(tries);
            tracing::warn!(
                attempt = tries,
                delay_ms = delay.as_millis() as u64,
                reason = report.failure_reason.as_deref().unwrap_or(""),
                "retrieval unavailable, retrying"
            );
            sleep(delay).await;
            tries += 1;
        }
    }

    /// Delay before retry number `attempt` (1-based): exponential, capped,
    /// with +/-25% jitter
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let delay_ms = exponential.min(self.max_delay_ms);

        let final_ms = if self.enable_jitter {
            let jitter = (delay_ms / 4) as f64;
            let offset = (rand::random::<f64>() * 2.0 - 1.0) * jitter;
            (delay_ms as f64 + offset).max(0.0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_ms)
    }
}
