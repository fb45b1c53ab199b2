//! Fixed-delay retry for acquiring the database connection.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Default number of connection attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Default pause between two connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// The last error seen once every attempt has failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Worst-case time between the first and the last attempt starting.
    pub fn max_wait(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }

    /// Run `op` until it succeeds or `max_attempts` attempts have failed.
    ///
    /// Attempts start `delay` apart; time spent inside a failed attempt is
    /// taken off the following pause. With attempts that finish within
    /// `delay`, the whole run stays within `max_attempts * delay`.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, Exhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let started = Instant::now();
            tracing::trace!(attempt, what, "Attempting");

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, what, "Succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= max_attempts => {
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        retry_in_secs = self.delay.as_secs_f64(),
                        what,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay.saturating_sub(started.elapsed())).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 100);
        assert_eq!(policy.delay, Duration::from_secs(5));
        assert_eq!(policy.max_wait(), Duration::from_secs(495));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_three_failures() {
        let calls = Cell::new(0u32);
        let start = Instant::now();

        let result = RetryPolicy::default()
            .run("connect", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n <= 3 {
                        Err(format!("refused #{n}"))
                    } else {
                        Ok("connected")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls.get(), 4);
        assert!(start.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0u32);
        let start = Instant::now();

        let result: Result<(), _> = RetryPolicy::default()
            .run("connect", || {
                calls.set(calls.get() + 1);
                async { Err("refused") }
            })
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 100);
        assert_eq!(exhausted.last_error, "refused");
        assert_eq!(calls.get(), 100);
        // No sleep after the final attempt.
        assert!(start.elapsed() >= Duration::from_secs(495));
        assert!(start.elapsed() < Duration::from_secs(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempts_stay_within_schedule() {
        let policy = RetryPolicy::new(4, Duration::from_secs(5));
        let start = Instant::now();

        let result: Result<(), _> = policy
            .run("connect", || async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Err("timed out")
            })
            .await;

        assert_eq!(result.unwrap_err().attempts, 4);
        // Attempts start at 0, 5, 10 and 15 s; the last one takes 3 s.
        assert!(start.elapsed() >= Duration::from_secs(18));
        assert!(start.elapsed() <= policy.delay * policy.max_attempts);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_wait() {
        let start = Instant::now();
        let result: Result<u8, Exhausted<&str>> =
            RetryPolicy::default().run("connect", || async { Ok(7) }).await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
