use std::future::Future;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use ln_core::config::{MAX_RETRIES, RETRY_DELAY};
use ln_core::FetchError;
use tracing::warn;

/// Bounded retry applied uniformly to every source fetch.
///
/// Only transient failures are retried. Rate limiting and blocking are
/// returned immediately so the hot path never hammers a source that
/// already said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            delay: RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub async fn run<T, F, Fut>(&self, source_name: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut backoff = Constant::new(self.delay);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff.next_backoff().unwrap_or(self.delay);
                    warn!(
                        "Attempt {} failed for {}, retrying in {:?}: {}",
                        attempt, source_name, delay, e.message
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
