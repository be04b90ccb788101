use std::time::Duration;

use rand::Rng;

use super::ProviderError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Exponential delay before retrying after the given 1-based attempt,
    /// without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }

    fn jitter(&self) -> Duration {
        let max = self.base_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }

    /// Runs `operation` until it succeeds, fails permanently or runs out of
    /// attempts. Only transient errors are retried.
    pub async fn run<T, F, Fut>(&self, name: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt) + self.jitter();
                    log::warn!(
                        "[RETRY] {name} failed on attempt {attempt}/{}: {error}. Retrying in {delay:?}",
                        self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
