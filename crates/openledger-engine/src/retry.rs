//! Jittered exponential backoff for conditional-write conflicts.
//!
//! One generic retry surface instead of ad-hoc loops at every call site.
//! Only transient errors ([`LedgerError::is_transient`]) are retried;
//! business-rule violations propagate immediately.

use std::future::Future;
use std::time::Duration;

use openledger_types::{Result, RetryConfig};
use rand::Rng;
use tokio::time::sleep;

/// Bounded retry with exponential backoff and jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    cfg: RetryConfig,
}

impl RetryPolicy {
    /// Build a policy, clamping degenerate configuration into usable bounds.
    #[must_use]
    pub fn new(cfg: RetryConfig) -> Self {
        let base = cfg.base_delay_ms.max(1);
        Self {
            cfg: RetryConfig {
                max_retries: cfg.max_retries.max(1),
                base_delay_ms: base,
                max_delay_ms: cfg.max_delay_ms.max(base),
                jitter_pct: cfg.jitter_pct.clamp(0.0, 1.0),
            },
        }
    }

    #[must_use]
    pub fn max_retries(&self) -> usize {
        self.cfg.max_retries
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    fn next_delay(&self, attempt: usize) -> Duration {
        let exp = 2_u64.saturating_pow(attempt as u32);
        let mut delay = self.cfg.base_delay_ms.saturating_mul(exp);
        if delay > self.cfg.max_delay_ms {
            delay = self.cfg.max_delay_ms;
        }
        let jittered = if self.cfg.jitter_pct > 0.0 {
            let spread = (delay as f64 * self.cfg.jitter_pct) as i64;
            let delta = rand::thread_rng().gen_range(-spread..=spread);
            delay.saturating_add_signed(delta)
        } else {
            delay
        };
        Duration::from_millis(jittered)
    }

    /// Run `op`, retrying transient failures with backoff between attempts.
    /// `op` receives the zero-based attempt index.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    if attempt >= self.cfg.max_retries {
                        return Err(err);
                    }
                    sleep(self.next_delay(attempt - 1)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
