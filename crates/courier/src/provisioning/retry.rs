//! Bounded retry with backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failed attempt.
    Fixed(Duration),
    /// `base`, `2 * base`, `4 * base`, ... capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay to wait after the `attempt`-th failure (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, max } => {
                let factor = 2_u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                base.checked_mul(factor).map_or(max, |delay| delay.min(max))
            }
        }
    }
}

/// What to do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Try again if attempts remain.
    Retry,
    /// Stop and surface the error.
    Abort,
}

/// Failure of a retried operation.
#[derive(Debug)]
pub struct RetryError<E> {
    /// Attempts made, including the last one.
    pub attempts: u32,
    /// Error of the last attempt.
    pub error: E,
    /// True when the last error was retryable but no attempts were left.
    pub exhausted: bool,
}

/// Maximum attempts and the backoff between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Backoff::Fixed(Duration::from_secs(1)))
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is raised to 1 if zero.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Total attempts allowed, first one included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay schedule.
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Run `op` until it succeeds, `classify` aborts, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the last error together with the number of attempts made.
    pub async fn run<T, E, F, Fut, C>(&self, mut op: F, classify: C) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> Verdict,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            let error = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if classify(&error) == Verdict::Abort {
                return Err(RetryError {
                    attempts: attempt,
                    error,
                    exhausted: false,
                });
            }
            if attempt >= self.max_attempts {
                return Err(RetryError {
                    attempts: attempt,
                    error,
                    exhausted: true,
                });
            }

            let delay = self.backoff.delay(attempt);
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const fn instant() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    const fn always_retry(_: &&str) -> Verdict {
        Verdict::Retry
    }

    #[test]
    fn test_zero_attempts_become_one() {
        assert_eq!(RetryPolicy::new(0, Backoff::Fixed(Duration::ZERO)).max_attempts(), 1);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_millis(350),
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(350));
        assert_eq!(backoff.delay(64), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let result = instant()
            .run(
                |attempt| async move { if attempt < 3 { Err("busy") } else { Ok(attempt) } },
                always_retry,
            )
            .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_stops_after_max_attempts() {
        let result: Result<(), _> = instant()
            .run(|_| async { Err("down") }, always_retry)
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert!(err.exhausted);
        assert_eq!(err.error, "down");
    }

    #[tokio::test]
    async fn test_abort_stops_immediately() {
        let result: Result<(), _> = instant()
            .run(|_| async { Err("conflict") }, |_| Verdict::Abort)
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 1);
        assert!(!err.exhausted);
    }
}
