//! Configuration types for the OpenLedger engine.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Bounds for the conditional-write retry loop.
///
/// Delays follow jittered exponential backoff: `base_delay_ms` doubling per
/// attempt, capped at `max_delay_ms`, with `jitter_pct` random spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum write attempts before surfacing `ConcurrentModification`.
    pub max_retries: usize,
    /// Base delay before the first retry (milliseconds).
    pub base_delay_ms: u64,
    /// Upper bound on any single delay (milliseconds).
    pub max_delay_ms: u64,
    /// Fraction of the delay applied as random jitter (0.0..=1.0).
    pub jitter_pct: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: constants::DEFAULT_MAX_RETRIES,
            base_delay_ms: constants::DEFAULT_BACKOFF_BASE_MS,
            max_delay_ms: constants::DEFAULT_BACKOFF_CAP_MS,
            jitter_pct: constants::DEFAULT_BACKOFF_JITTER_PCT,
        }
    }
}

/// Configuration for the background consistency verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Seconds between full reconciliation sweeps.
    pub scan_interval_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: constants::DEFAULT_VERIFY_INTERVAL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_defaults_match_constants() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.base_delay_ms, 10);
        assert_eq!(cfg.max_delay_ms, 100);
        assert!(cfg.jitter_pct > 0.0 && cfg.jitter_pct <= 1.0);
    }

    #[test]
    fn retry_config_serde_roundtrip() {
        let cfg = RetryConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RetryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.max_retries, back.max_retries);
        assert_eq!(cfg.base_delay_ms, back.base_delay_ms);
    }

    #[test]
    fn verifier_defaults() {
        let cfg = VerifierConfig::default();
        assert_eq!(cfg.scan_interval_secs, 300);
    }
}
