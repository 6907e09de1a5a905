use anyhow::Result;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Attempt budget and exponential backoff for a flaky operation
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Wait after the given failed attempt (1-based): base doubled per attempt, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds or the attempt budget is spent, sleeping between tries
    pub fn run<T>(&self, op: impl FnMut(u32) -> Result<T>) -> Result<T> {
        self.run_with_sleep(op, thread::sleep)
    }

    pub fn run_with_sleep<T>(
        &self,
        mut op: impl FnMut(u32) -> Result<T>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => {
                    return Err(e.context(format!("giving up after {} attempts", attempts)));
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "Attempt {}/{} failed: {:#}; retrying in {:?}",
                        attempt, attempts, e, delay
                    );
                    sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(8));
        assert_eq!(policy.backoff(3), Duration::from_secs(10));
        assert_eq!(policy.backoff(40), Duration::from_secs(10));
    }

    #[test]
    fn test_gives_up_after_three_attempts() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let mut delays = Vec::new();

        let result: Result<()> = policy.run_with_sleep(
            |_| {
                calls += 1;
                bail!("timed out waiting for results table")
            },
            |d| delays.push(d),
        );

        let err = result.unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(delays, vec![Duration::from_secs(4), Duration::from_secs(8)]);
        assert!(delays[1] > delays[0]);
        assert!(format!("{:#}", err).contains("timed out waiting for results table"));
        assert!(err.to_string().contains("giving up after 3 attempts"));
    }

    #[test]
    fn test_stops_on_first_success() {
        let policy = RetryPolicy::default();
        let mut delays = Vec::new();

        let value = policy
            .run_with_sleep(
                |attempt| {
                    if attempt < 2 {
                        bail!("flaky")
                    }
                    Ok(attempt)
                },
                |d| delays.push(d),
            )
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(delays, vec![Duration::from_secs(4)]);
    }
}
