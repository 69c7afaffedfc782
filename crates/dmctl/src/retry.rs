//! Exponential backoff for reconnect attempts.
//!
//! Mirrors the gRPC connection-backoff algorithm: the delay starts at
//! `base_delay`, grows by `multiplier` after every failure, is randomized by
//! `jitter` and never exceeds `max_delay`. There is no attempt limit; callers
//! bound the whole loop with a deadline.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Backoff parameters between connection attempts.
#[derive(Clone, Debug)]
pub struct Backoff {
    /// Delay after the first failure
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Growth factor applied after each failure
    pub multiplier: f64,
    /// Relative randomization, 0.2 means +/-20%
    pub jitter: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(120),
            multiplier: 1.6,
            jitter: 0.2,
        }
    }
}

impl Backoff {
    /// Default backoff with its delay ceiling lowered to `max_delay`
    pub fn with_max_delay(max_delay: Duration) -> Self {
        Self {
            max_delay,
            ..Default::default()
        }
    }

    /// Delay before retry number `retries` (0-based), without jitter
    pub fn delay_for(&self, retries: u32) -> Duration {
        let grown = self.base_delay.as_secs_f64() * self.multiplier.powi(retries as i32);
        Duration::from_secs_f64(grown.min(self.max_delay.as_secs_f64()))
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(1.0 - self.jitter..1.0 + self.jitter);
        Duration::from_secs_f64((delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64()))
    }
}

/// Run `operation` until it succeeds, sleeping per `backoff` between failures.
///
/// Never gives up on its own; wrap in `tokio::time::timeout` to bound it.
pub async fn retry_forever<F, Fut, T, E>(backoff: &Backoff, target: &str, mut operation: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut retries = 0u32;
    loop {
        match operation().await {
            Ok(value) => return value,
            Err(e) => {
                let delay = backoff.jittered(backoff.delay_for(retries));
                warn!(
                    target_addr = %target,
                    attempt = retries + 1,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Connection attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                retries = retries.saturating_add(1);
            }
        }
    }
}
