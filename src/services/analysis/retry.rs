//! Retry policy for completion calls
//!
//! Only errors that report `is_retryable()` are retried. The default policy
//! makes a single attempt.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use super::error::AnalysisError;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RetryPolicy {
    /// Fail on the first error
    #[default]
    None,
    /// Exponential backoff capped at `max_interval`, with optional full jitter
    Exponential {
        max_retries: u32,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
        jitter: bool,
    },
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::None
    }

    pub fn exponential(
        max_retries: u32,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
        jitter: bool,
    ) -> Self {
        Self::Exponential { max_retries, initial_interval, max_interval, multiplier, jitter }
    }

    /// Total number of calls this policy allows, including the first.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Exponential { max_retries, .. } => max_retries.saturating_add(1),
        }
    }

    /// Whether another call may follow the given failed attempt (0-based).
    pub fn should_retry(&self, attempt: u32, err: &AnalysisError) -> bool {
        err.is_retryable() && attempt + 1 < self.max_attempts()
    }

    /// Upper bound of the wait after the given failed attempt (0-based), before jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Exponential { initial_interval, max_interval, multiplier, .. } => {
                let exp = multiplier.powi(attempt.min(i32::MAX as u32) as i32);
                let secs = initial_interval.as_secs_f64() * exp;
                if !secs.is_finite() || secs >= max_interval.as_secs_f64() {
                    *max_interval
                } else {
                    Duration::from_secs_f64(secs)
                }
            },
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let cap = self.backoff(attempt);
        match self {
            Self::Exponential { jitter: true, .. } if !cap.is_zero() => {
                let millis = cap.as_millis().min(u64::MAX as u128) as u64;
                Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
            },
            _ => cap,
        }
    }

    /// Run `op` until it succeeds, returns a non-retryable error, or attempts run out.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, AnalysisError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(attempt, &err) => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        "Completion attempt {} failed ({}), retrying in {:?}",
                        attempt + 1,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }
}
