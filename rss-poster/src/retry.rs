use backoff::{backoff::Backoff, exponential::ExponentialBackoff, SystemClock};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded, deterministic exponential backoff.
///
/// The first retry waits `initial_delay`, every following retry waits twice
/// as long, capped at `max_delay`. At most `max_attempts` calls are made in
/// total. Callers classify each failure with [`backoff::Error`]: transient
/// errors are retried, permanent ones end the loop at once.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: max_delay.max(initial_delay),
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    fn backoff(&self) -> ExponentialBackoff<SystemClock> {
        ExponentialBackoff {
            current_interval: self.initial_delay,
            initial_interval: self.initial_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: self.max_delay,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// The sleeps taken between attempts, in order (`max_attempts - 1` of them).
    pub fn delays(&self) -> Vec<Duration> {
        let mut backoff = self.backoff();
        (1..self.max_attempts)
            .map(|_| {
                let delay = backoff.next_backoff().unwrap_or(self.max_delay);
                // whole milliseconds
                Duration::from_millis(delay.as_millis() as u64)
            })
            .collect()
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. The last error is returned on failure.
    pub async fn retry<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, backoff::Error<E>>>,
        E: std::fmt::Display,
    {
        let mut delays = self.delays().into_iter();
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(backoff::Error::Permanent(err)) => return Err(err),
                Err(backoff::Error::Transient { err, .. }) => {
                    let Some(delay) = delays.next() else {
                        warn!("{}: giving up after {} attempts: {}", label, attempt, err);
                        return Err(err);
                    };
                    warn!("{}: attempt {} failed, retrying in {:?}: {}", label, attempt, delay, err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
